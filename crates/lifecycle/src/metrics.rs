// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Load and generation metrics.
//!
//! These are the device's only diagnostics besides the LEDs: load time is
//! reported once at boot, throughput after every story.

use std::time::Duration;

/// What boot-time loading cost.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct LoadMetrics {
    /// Wall-clock time from the first file read to a ready sampler.
    pub duration: Duration,
    pub model_bytes: usize,
    pub tokenizer_bytes: usize,
    pub vocab_size: usize,
    pub seq_len: usize,
    /// Step budget after clamping to `seq_len`.
    pub effective_steps: usize,
}

impl LoadMetrics {
    pub fn seconds(&self) -> f64 {
        self.duration.as_secs_f64()
    }

    pub fn summary(&self) -> String {
        format!(
            "Load: {:.2} s, model {:.2} MB, tokenizer {:.2} KB, vocab {}, seq_len {}, {} steps/run",
            self.seconds(),
            self.model_bytes as f64 / (1024.0 * 1024.0),
            self.tokenizer_bytes as f64 / 1024.0,
            self.vocab_size,
            self.seq_len,
            self.effective_steps,
        )
    }
}

/// How a generation run ended.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RunOutcome {
    Completed {
        tokens: usize,
        tokens_per_second: f64,
    },
    Failed {
        reason: String,
    },
}

/// Result of one trip through the GENERATING phase.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct GenerationReport {
    /// Step budget the run was given.
    pub max_steps: usize,
    /// Wall-clock time spent inside the engine.
    pub duration: Duration,
    pub outcome: RunOutcome,
}

impl GenerationReport {
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, RunOutcome::Completed { .. })
    }

    /// Engine-reported throughput, or `None` for a failed run.
    pub fn tokens_per_second(&self) -> Option<f64> {
        match self.outcome {
            RunOutcome::Completed {
                tokens_per_second, ..
            } => Some(tokens_per_second),
            RunOutcome::Failed { .. } => None,
        }
    }

    pub fn summary(&self) -> String {
        match &self.outcome {
            RunOutcome::Completed {
                tokens,
                tokens_per_second,
            } => format!(
                "Generation: {tokens} tokens in {:.2} s, averaged {tokens_per_second:.2} tokens/s",
                self.duration.as_secs_f64(),
            ),
            RunOutcome::Failed { reason } => format!(
                "Generation failed after {:.2} s: {reason}",
                self.duration.as_secs_f64()
            ),
        }
    }
}

/// Running totals kept by the device controller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct DeviceStats {
    /// Triggers that moved the device from ARMED to GENERATING.
    pub triggers_handled: u64,
    pub runs_completed: u64,
    pub runs_failed: u64,
}

impl DeviceStats {
    pub(crate) fn record(&mut self, report: &GenerationReport) {
        if report.is_success() {
            self.runs_completed += 1;
        } else {
            self.runs_failed += 1;
        }
    }
}
