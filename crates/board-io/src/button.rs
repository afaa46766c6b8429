// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Debounced button interrupts.

use crate::{BoardError, Debouncer, WakeToken};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// An edge-triggered input that can be bound to a wake token.
pub trait InterruptSource {
    /// Binds the interrupt: after this call every debounced edge signals
    /// `wake`. Called once at boot.
    fn configure(&mut self, debounce: Duration, wake: WakeToken) -> Result<(), BoardError>;
}

#[derive(Debug)]
struct Binding {
    debouncer: Debouncer,
    wake: WakeToken,
}

/// A host-side button whose edges are injected through [`ButtonLine`]s.
///
/// Edges raised before [`configure`](InterruptSource::configure) are
/// ignored, like an interrupt line that has not been enabled yet.
#[derive(Debug, Default)]
pub struct HostButton {
    binding: Arc<Mutex<Option<Binding>>>,
}

impl HostButton {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a handle for raising edges on this button.
    pub fn line(&self) -> ButtonLine {
        ButtonLine {
            binding: Arc::clone(&self.binding),
        }
    }
}

impl InterruptSource for HostButton {
    fn configure(&mut self, debounce: Duration, wake: WakeToken) -> Result<(), BoardError> {
        if debounce.is_zero() {
            return Err(BoardError::ZeroDebounce);
        }
        let mut binding = self
            .binding
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if binding.is_some() {
            return Err(BoardError::AlreadyConfigured);
        }
        *binding = Some(Binding {
            debouncer: Debouncer::new(debounce),
            wake,
        });
        tracing::debug!(debounce_us = debounce.as_micros() as u64, "button interrupt configured");
        Ok(())
    }
}

/// Raises edges on a [`HostButton`]. Clonable and `Send`, so stdin readers,
/// GPIO pollers, and test harnesses can all press the same button.
#[derive(Debug, Clone)]
pub struct ButtonLine {
    binding: Arc<Mutex<Option<Binding>>>,
}

impl ButtonLine {
    /// Raises an edge now.
    pub fn press(&self) -> bool {
        self.press_at(Instant::now())
    }

    /// Raises an edge at `at`. Returns `true` only if the edge passed the
    /// debouncer *and* resumed a parked task.
    pub fn press_at(&self, at: Instant) -> bool {
        let mut guard = self
            .binding
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let Some(binding) = guard.as_mut() else {
            tracing::debug!("edge on unconfigured button ignored");
            return false;
        };
        if !binding.debouncer.accept(at) {
            tracing::debug!("bounce suppressed");
            return false;
        }
        let resumed = binding.wake.signal();
        if !resumed {
            tracing::debug!("trigger dropped: control task not waiting");
        }
        resumed
    }
}
