// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The engine contract consumed by the lifecycle controller.

use crate::EngineError;

/// What the controller is allowed to know about a loaded model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct ModelSpec {
    /// Number of entries in the vocabulary.
    pub vocab_size: usize,
    /// Maximum sequence length the model supports.
    pub seq_len: usize,
}

impl ModelSpec {
    /// Clamps a configured step budget to this model.
    ///
    /// A budget of zero, or one larger than the sequence length, becomes the
    /// sequence length.
    pub fn clamp_steps(&self, configured: usize) -> usize {
        if configured == 0 || configured > self.seq_len {
            self.seq_len
        } else {
            configured
        }
    }
}

/// Parameters for building a sampler.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplerParams {
    pub vocab_size: usize,
    pub temperature: f32,
    pub top_p: f32,
    pub seed: u64,
}

/// Result of one completed generation run.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct GenerationOutcome {
    /// Tokens produced (prompt tokens excluded).
    pub tokens_generated: usize,
    /// Average throughput over the run.
    pub tokens_per_second: f64,
}

/// An inference engine.
///
/// Build methods borrow byte spans and return owned handles; the caller
/// owns the bytes and must keep them alive for as long as it keeps the
/// handles. The `free_*` methods consume handles; their default
/// implementations simply drop them.
pub trait InferenceEngine {
    /// Loaded transformer configuration and weights.
    type Model;
    /// Tokenizer vocabulary.
    type Tokenizer;
    /// Sampling state, including its RNG.
    type Sampler;

    /// Parses a checkpoint.
    fn build_transformer(&self, checkpoint: &[u8]) -> Result<Self::Model, EngineError>;

    /// Reports the documented accessors of a built model.
    fn model_spec(&self, model: &Self::Model) -> ModelSpec;

    /// Parses a tokenizer file for a vocabulary of `vocab_size` entries.
    fn build_tokenizer(
        &self,
        vocab: &[u8],
        vocab_size: usize,
    ) -> Result<Self::Tokenizer, EngineError>;

    /// Creates a sampler.
    fn build_sampler(&self, params: SamplerParams) -> Self::Sampler;

    /// Runs autoregressive generation from `prompt` for at most `max_steps`
    /// positions.
    fn generate(
        &self,
        model: &Self::Model,
        tokenizer: &Self::Tokenizer,
        sampler: &mut Self::Sampler,
        prompt: &str,
        max_steps: usize,
    ) -> Result<GenerationOutcome, EngineError>;

    fn free_sampler(&self, sampler: Self::Sampler) {
        drop(sampler);
    }

    fn free_tokenizer(&self, tokenizer: Self::Tokenizer) {
        drop(tokenizer);
    }

    fn free_transformer(&self, model: Self::Model) {
        drop(model);
    }
}
