// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Trigger controller: binds the button to the control task.

use crate::LifecycleError;
use board_io::{InterruptSource, LatchStats, TaskLatch, WakeToken};
use std::time::Duration;

/// Owns the interrupt source and the latch the control task parks on.
///
/// A trigger is a debounced press that lands while the task is parked in
/// [`wait_for_trigger`](Self::wait_for_trigger). Presses at any other time
/// are lost; nothing is queued for later.
#[derive(Debug)]
pub struct TriggerController<S: InterruptSource> {
    source: S,
    latch: TaskLatch,
    debounce: Duration,
    armed: bool,
}

impl<S: InterruptSource> TriggerController<S> {
    pub fn new(source: S, debounce: Duration) -> Self {
        Self {
            source,
            latch: TaskLatch::new(),
            debounce,
            armed: false,
        }
    }

    /// Binds the button's interrupt to this controller's wake token.
    ///
    /// Only the first call configures the source; later calls are no-ops.
    pub fn arm(&mut self) -> Result<(), LifecycleError> {
        if self.armed {
            return Ok(());
        }
        self.source.configure(self.debounce, self.latch.token())?;
        self.armed = true;
        tracing::info!(
            debounce_ms = self.debounce.as_millis() as u64,
            "button armed"
        );
        Ok(())
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    /// Parks the control task until the next trigger.
    ///
    /// Each call waits for a fresh trigger: presses that arrived before the
    /// call do not complete it.
    pub async fn wait_for_trigger(&mut self) -> Result<(), LifecycleError> {
        if !self.armed {
            return Err(LifecycleError::NotArmed);
        }
        tracing::debug!("waiting for trigger");
        self.latch.park().await;
        tracing::debug!("triggered");
        Ok(())
    }

    /// A token that resumes the parked task, for sources wired up outside
    /// [`InterruptSource::configure`].
    pub fn wake_token(&self) -> WakeToken {
        self.latch.token()
    }

    pub fn is_waiting(&self) -> bool {
        self.latch.is_parked()
    }

    pub fn latch_stats(&self) -> LatchStats {
        self.latch.stats()
    }

    pub fn source(&self) -> &S {
        &self.source
    }
}
