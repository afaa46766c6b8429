// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Device phases and their indicator patterns.

use board_io::{Indicators, Led};
use std::fmt;

/// The device's current operating mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
pub enum Phase {
    Loading,
    Armed,
    Generating,
}

/// What the two indicator LEDs show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct IndicatorState {
    pub busy: bool,
    pub armed: bool,
}

impl Phase {
    pub fn indicators(self) -> IndicatorState {
        match self {
            Phase::Loading | Phase::Generating => IndicatorState {
                busy: true,
                armed: false,
            },
            Phase::Armed => IndicatorState {
                busy: false,
                armed: true,
            },
        }
    }

    /// Drives both LEDs to this phase's pattern.
    pub fn show<I: Indicators + ?Sized>(self, indicators: &mut I) {
        let state = self.indicators();
        indicators.set(Led::Status, state.busy);
        indicators.set(Led::User, state.armed);
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Phase::Loading => "LOADING",
            Phase::Armed => "ARMED",
            Phase::Generating => "GENERATING",
        })
    }
}
