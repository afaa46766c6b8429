// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # lifecycle
//!
//! The controller that turns a button into a storyteller.
//!
//! The device loads its model exactly once, then alternates forever between
//! waiting for a button press and generating a story:
//!
//! ```text
//!   LOADING ──► ARMED ──trigger──► GENERATING
//!                 ▲                    │
//!                 └────────────────────┘
//! ```
//!
//! | phase | status LED (busy) | user LED (armed) |
//! |---|---|---|
//! | LOADING | on | off |
//! | ARMED | off | on |
//! | GENERATING | on | off |
//!
//! # Components
//! - [`ModelLifecycle`] — type-state model manager:
//!   `ModelLifecycle<E, Unloaded>` → `.load()` → `ModelLifecycle<E, Loaded<E>>`
//!   → `.unload()`. Generation is only reachable on a loaded model, and
//!   unloading consumes it, so it can never overlap a run.
//! - [`TriggerController`] — binds the button interrupt to a wake token and
//!   parks the control task until the next press.
//! - [`run_generation`] — the generation boundary: engine errors and panics
//!   stop here and become a failed [`GenerationReport`].
//! - [`DeviceController`] — owns all of the above plus the current
//!   [`Phase`], and drives the indicators.
//!
//! # Concurrency
//! One control task runs the loop. Only `wait_for_trigger` yields; load and
//! generation run to completion without yielding. Nothing is shared with
//! the interrupt side except the wake token, so model state needs no lock.

mod config;
mod device;
mod error;
mod metrics;
mod model;
mod orchestrator;
mod phase;
mod trigger;

pub use config::{DeviceConfig, GenerationParams};
pub use device::DeviceController;
pub use error::{LifecycleError, LoadFailure, LoadStage};
pub use metrics::{DeviceStats, GenerationReport, LoadMetrics, RunOutcome};
pub use model::{LifecycleState, Loaded, ModelLifecycle, Unloaded};
pub use orchestrator::run_generation;
pub use phase::{IndicatorState, Phase};
pub use trigger::TriggerController;
