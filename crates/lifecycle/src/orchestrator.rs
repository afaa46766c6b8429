// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The generation boundary.
//!
//! One call runs one story to completion. Whatever goes wrong inside the
//! engine, an error or a panic, is turned into a failed
//! [`GenerationReport`] here so the device can re-arm.

use crate::{GenerationReport, LifecycleError, Loaded, ModelLifecycle, RunOutcome};
use story_engine::{GenerationOutcome, InferenceEngine};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::time::Instant;

/// Generates one story from `prompt` with the model's clamped step budget.
///
/// Never yields and never fails: the outcome is carried in the report.
pub fn run_generation<E: InferenceEngine>(
    model: &mut ModelLifecycle<E, Loaded<E>>,
    prompt: &str,
) -> GenerationReport {
    let max_steps = model.effective_steps();
    tracing::info!(max_steps, prompt_len = prompt.len(), "generating story");

    let start = Instant::now();
    let result = guarded_generate(model, prompt);
    let duration = start.elapsed();

    let outcome = match result {
        Ok(outcome) => {
            tracing::info!(
                tokens = outcome.tokens_generated,
                "averaged {:.2} tokens/s",
                outcome.tokens_per_second
            );
            RunOutcome::Completed {
                tokens: outcome.tokens_generated,
                tokens_per_second: outcome.tokens_per_second,
            }
        }
        Err(e) => {
            tracing::warn!("{e}");
            RunOutcome::Failed {
                reason: e.to_string(),
            }
        }
    };

    GenerationReport {
        max_steps,
        duration,
        outcome,
    }
}

fn guarded_generate<E: InferenceEngine>(
    model: &mut ModelLifecycle<E, Loaded<E>>,
    prompt: &str,
) -> Result<GenerationOutcome, LifecycleError> {
    match panic::catch_unwind(AssertUnwindSafe(|| model.generate(prompt))) {
        Ok(Ok(outcome)) => Ok(outcome),
        Ok(Err(e)) => Err(LifecycleError::Generation(e.to_string())),
        Err(payload) => Err(LifecycleError::Generation(format!(
            "engine panicked: {}",
            panic_message(payload.as_ref())
        ))),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s
    } else {
        "unknown panic payload"
    }
}
