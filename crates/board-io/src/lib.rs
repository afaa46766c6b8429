// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # board-io
//!
//! The thin hardware-facing layer of the story device.
//!
//! # Components
//! - **Indicators** — the status (busy) and user (armed) LEDs, via the
//!   [`Indicators`] trait. [`SysfsIndicators`] drives Linux LED class
//!   devices; [`LogIndicators`] only logs.
//! - **Wake-up** — [`TaskLatch`] parks the control task; the [`WakeToken`]
//!   it hands out is the only thing an interrupt handler may touch.
//! - **Interrupts** — [`InterruptSource`] configures a debounced edge
//!   interrupt. [`HostButton`] is a host-side source fed through a
//!   [`ButtonLine`] (stdin, a test harness, or a GPIO poller).
//! - **Clock** — [`boot_ticks`], a monotonically advancing millisecond tick
//!   counter used for sampler seeding.
//!
//! # Graceful Degradation
//! LED writes never fail the caller. A missing or read-only sysfs LED is
//! logged once and then ignored, so the device keeps running without its
//! indicators.

mod button;
mod clock;
mod debounce;
mod error;
mod indicator;
mod sysfs;
mod wake;

pub use button::{ButtonLine, HostButton, InterruptSource};
pub use clock::boot_ticks;
pub use debounce::{Debouncer, DEFAULT_DEBOUNCE};
pub use error::BoardError;
pub use indicator::{Indicators, Led, LogIndicators};
pub use sysfs::{SysfsIndicators, SysfsLed};
pub use wake::{LatchStats, TaskLatch, WakeToken};
