// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Indicator LEDs.

use std::fmt;

/// The two indicator LEDs on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Led {
    /// Lit while the device is busy (loading or generating).
    Status,
    /// Lit while the device is armed and waiting for the button.
    User,
}

impl fmt::Display for Led {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Led::Status => write!(f, "status"),
            Led::User => write!(f, "user"),
        }
    }
}

/// Output driver for the indicator LEDs.
///
/// Setting an LED must not block for long and must not fail the caller;
/// drivers that can fail report the problem through logging.
pub trait Indicators {
    fn set(&mut self, led: Led, on: bool);
}

impl<T: Indicators + ?Sized> Indicators for Box<T> {
    fn set(&mut self, led: Led, on: bool) {
        (**self).set(led, on)
    }
}

/// Indicators that only emit a log line per change.
#[derive(Debug, Default)]
pub struct LogIndicators {
    status: Option<bool>,
    user: Option<bool>,
}

impl LogIndicators {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last value written to `led`, if any.
    pub fn get(&self, led: Led) -> Option<bool> {
        match led {
            Led::Status => self.status,
            Led::User => self.user,
        }
    }
}

impl Indicators for LogIndicators {
    fn set(&mut self, led: Led, on: bool) {
        let slot = match led {
            Led::Status => &mut self.status,
            Led::User => &mut self.user,
        };
        if *slot != Some(on) {
            tracing::info!(led = %led, on, "indicator");
        }
        *slot = Some(on);
    }
}
