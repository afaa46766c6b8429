// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Edge debouncing.
//!
//! An edge is accepted if no edge has been accepted within the preceding
//! window. Bounces are measured from the last *accepted* edge, so a burst
//! of chatter shorter than the window yields exactly one event however long
//! the individual gaps are.

use std::time::{Duration, Instant};

/// Debounce window used by the button interrupt (50 ms).
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_micros(50_000);

/// Stateful debounce filter for one input line.
#[derive(Debug, Clone)]
pub struct Debouncer {
    window: Duration,
    last_accepted: Option<Instant>,
}

impl Debouncer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last_accepted: None,
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Returns `true` if an edge at `at` should be delivered.
    pub fn accept(&mut self, at: Instant) -> bool {
        let quiet = match self.last_accepted {
            None => true,
            Some(last) => at.saturating_duration_since(last) >= self.window,
        };
        if quiet {
            self.last_accepted = Some(at);
        }
        quiet
    }
}
