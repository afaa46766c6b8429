// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Model lifecycle manager with a type-state load/unload pipeline.
//!
//! ```text
//! ModelLifecycle<E, Unloaded>
//!     │  .load(&config)        reads both files, builds model, tokenizer, sampler
//!     ▼
//! ModelLifecycle<E, Loaded<E>>
//!     │  .unload()             frees sampler, tokenizer, model, then buffers
//!     ▼
//! ModelLifecycle<E, Unloaded>
//! ```
//!
//! There is no partially loaded value: `load` either returns a fully built
//! `Loaded` manager or an error, and the buffers read so far are released
//! on the way out. Firmware never calls `unload`; the model stays resident
//! until reset.

use crate::{DeviceConfig, LifecycleError, LoadMetrics, LoadStage};
use resident_memory::{ResidencyLedger, ResidentBuffer};
use story_engine::{EngineError, GenerationOutcome, InferenceEngine, ModelSpec, SamplerParams};
use std::time::Instant;

// ── Type-state markers ─────────────────────────────────────────

/// No model is resident.
#[derive(Debug)]
pub struct Unloaded;

/// Model, tokenizer, sampler, and their buffers are resident.
pub struct Loaded<E: InferenceEngine> {
    resident: Resident<E>,
}

/// Marker trait for lifecycle states.
pub trait LifecycleState {}
impl LifecycleState for Unloaded {}
impl<E: InferenceEngine> LifecycleState for Loaded<E> {}

/// Everything that lives for the device's operating life.
///
/// Field order matters: engine handles drop before the bytes behind them.
struct Resident<E: InferenceEngine> {
    model: E::Model,
    tokenizer: E::Tokenizer,
    sampler: E::Sampler,
    spec: ModelSpec,
    effective_steps: usize,
    metrics: LoadMetrics,
    tokenizer_buffer: ResidentBuffer,
    model_buffer: ResidentBuffer,
}

// ── Manager ────────────────────────────────────────────────────

/// Owns the engine and, once loaded, every structure it built.
pub struct ModelLifecycle<E: InferenceEngine, S: LifecycleState = Unloaded> {
    engine: E,
    ledger: ResidencyLedger,
    state: S,
}

impl<E: InferenceEngine, S: LifecycleState> ModelLifecycle<E, S> {
    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Bytes currently held by model and tokenizer buffers.
    pub fn resident_bytes(&self) -> usize {
        self.ledger.resident_bytes()
    }

    pub fn ledger(&self) -> &ResidencyLedger {
        &self.ledger
    }
}

impl<E: InferenceEngine> ModelLifecycle<E, Unloaded> {
    pub fn new(engine: E, ledger: ResidencyLedger) -> Self {
        Self {
            engine,
            ledger,
            state: Unloaded,
        }
    }

    /// Loads model and tokenizer and builds a sampler.
    ///
    /// Steps:
    /// 1. Read (or map) the checkpoint into a resident buffer.
    /// 2. Build the transformer and clamp the step budget to its sequence
    ///    length.
    /// 3. Read the tokenizer and build it for the model's vocabulary size.
    /// 4. Build a sampler seeded from the boot tick counter. The seed is
    ///    not reproducible across boots, and is not meant to be.
    pub fn load(self, config: &DeviceConfig) -> Result<ModelLifecycle<E, Loaded<E>>, LifecycleError> {
        self.load_seeded(config, board_io::boot_ticks)
    }

    /// As [`load`](Self::load), with the seed taken from `seed` at the point
    /// the sampler is built.
    pub fn load_seeded(
        self,
        config: &DeviceConfig,
        seed: impl FnOnce() -> u64,
    ) -> Result<ModelLifecycle<E, Loaded<E>>, LifecycleError> {
        tracing::info!("loading model {}", config.model_path.display());
        let start = Instant::now();

        let model_path = &config.model_path;
        let model_buffer = if config.map_model {
            self.ledger.map_file("model", model_path)
        } else {
            self.ledger.read_file("model", model_path)
        }
        .map_err(|e| LifecycleError::load(LoadStage::ModelFile, model_path, e))?;

        let model = self
            .engine
            .build_transformer(&model_buffer)
            .map_err(|e| LifecycleError::load(LoadStage::Transformer, model_path, e))?;
        let spec = self.engine.model_spec(&model);
        let effective_steps = spec.clamp_steps(config.max_steps);
        if effective_steps != config.max_steps {
            tracing::debug!(
                configured = config.max_steps,
                effective_steps,
                "step budget clamped to sequence length"
            );
        }

        let tokenizer_path = &config.tokenizer_path;
        let tokenizer_buffer = self
            .ledger
            .read_file("tokenizer", tokenizer_path)
            .map_err(|e| LifecycleError::load(LoadStage::TokenizerFile, tokenizer_path, e))?;
        let tokenizer = self
            .engine
            .build_tokenizer(&tokenizer_buffer, spec.vocab_size)
            .map_err(|e| LifecycleError::load(LoadStage::Tokenizer, tokenizer_path, e))?;

        let sampler = self.engine.build_sampler(SamplerParams {
            vocab_size: spec.vocab_size,
            temperature: config.temperature,
            top_p: config.top_p,
            seed: seed(),
        });

        let metrics = LoadMetrics {
            duration: start.elapsed(),
            model_bytes: model_buffer.len(),
            tokenizer_bytes: tokenizer_buffer.len(),
            vocab_size: spec.vocab_size,
            seq_len: spec.seq_len,
            effective_steps,
        };
        tracing::info!("model loading took {:.2} s", metrics.seconds());
        tracing::debug!("{}", metrics.summary());

        Ok(ModelLifecycle {
            engine: self.engine,
            ledger: self.ledger,
            state: Loaded {
                resident: Resident {
                    model,
                    tokenizer,
                    sampler,
                    spec,
                    effective_steps,
                    metrics,
                    tokenizer_buffer,
                    model_buffer,
                },
            },
        })
    }
}

impl<E: InferenceEngine> ModelLifecycle<E, Loaded<E>> {
    pub fn spec(&self) -> ModelSpec {
        self.state.resident.spec
    }

    /// Step budget every run gets.
    pub fn effective_steps(&self) -> usize {
        self.state.resident.effective_steps
    }

    pub fn load_metrics(&self) -> &LoadMetrics {
        &self.state.resident.metrics
    }

    /// Runs the engine once. Callers go through
    /// [`run_generation`](crate::run_generation), which contains failures.
    pub(crate) fn generate(&mut self, prompt: &str) -> Result<GenerationOutcome, EngineError> {
        let resident = &mut self.state.resident;
        self.engine.generate(
            &resident.model,
            &resident.tokenizer,
            &mut resident.sampler,
            prompt,
            resident.effective_steps,
        )
    }

    /// Tears everything down: sampler, tokenizer, and transformer first,
    /// then the two buffers.
    ///
    /// Consumes the loaded manager, so it cannot run twice or while a
    /// generation holds a borrow.
    pub fn unload(self) -> ModelLifecycle<E, Unloaded> {
        tracing::info!("unloading model");
        let Resident {
            model,
            tokenizer,
            sampler,
            tokenizer_buffer,
            model_buffer,
            ..
        } = self.state.resident;

        self.engine.free_sampler(sampler);
        self.engine.free_tokenizer(tokenizer);
        self.engine.free_transformer(model);
        drop(tokenizer_buffer);
        drop(model_buffer);

        ModelLifecycle {
            engine: self.engine,
            ledger: self.ledger,
            state: Unloaded,
        }
    }
}

impl<E: InferenceEngine, S: LifecycleState> std::fmt::Debug for ModelLifecycle<E, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelLifecycle")
            .field("state", &std::any::type_name::<S>())
            .field("resident_bytes", &self.resident_bytes())
            .finish()
    }
}
