// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! [`UnigramEngine`]: the llama2.c reference engine without a forward pass.

use super::{Checkpoint, Sampler, Vocabulary, BOS_TOKEN};
use crate::{EngineError, GenerationOutcome, InferenceEngine, ModelSpec, SamplerParams};
use std::io::Write;
use std::sync::Mutex;
use std::time::Instant;

/// Generates text by sampling directly from vocabulary merge scores.
///
/// Prompt tokens are forced in order, exactly as a real transformer would
/// consume them; after the prompt every position is sampled. Generation
/// stops at the step budget or when BOS is sampled. Decoded text is
/// streamed to the output sink as it is produced.
pub struct UnigramEngine {
    out: Mutex<Box<dyn Write + Send>>,
}

impl UnigramEngine {
    /// Creates an engine writing generated text to `out`.
    pub fn new(out: Box<dyn Write + Send>) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    /// Creates an engine writing generated text to standard output.
    pub fn stdout() -> Self {
        Self::new(Box::new(std::io::stdout()))
    }
}

impl InferenceEngine for UnigramEngine {
    type Model = Checkpoint;
    type Tokenizer = Vocabulary;
    type Sampler = Sampler;

    fn build_transformer(&self, checkpoint: &[u8]) -> Result<Checkpoint, EngineError> {
        let ckpt = Checkpoint::parse(checkpoint)?;
        tracing::debug!(
            dim = ckpt.header.dim,
            layers = ckpt.header.n_layers,
            vocab = ckpt.header.vocab_size,
            seq_len = ckpt.header.seq_len,
            format = ?ckpt.header.format,
            "checkpoint parsed"
        );
        Ok(ckpt)
    }

    fn model_spec(&self, model: &Checkpoint) -> ModelSpec {
        model.spec()
    }

    fn build_tokenizer(&self, vocab: &[u8], vocab_size: usize) -> Result<Vocabulary, EngineError> {
        Vocabulary::parse(vocab, vocab_size)
    }

    fn build_sampler(&self, params: SamplerParams) -> Sampler {
        Sampler::new(params)
    }

    fn generate(
        &self,
        model: &Checkpoint,
        tokenizer: &Vocabulary,
        sampler: &mut Sampler,
        prompt: &str,
        max_steps: usize,
    ) -> Result<GenerationOutcome, EngineError> {
        let vocab_size = model.spec().vocab_size;
        if tokenizer.len() != vocab_size || sampler.vocab_size() != vocab_size {
            return Err(EngineError::Internal(format!(
                "vocabulary mismatch: model {vocab_size}, tokenizer {}, sampler {}",
                tokenizer.len(),
                sampler.vocab_size()
            )));
        }

        let prompt_tokens = tokenizer.encode(prompt);
        let mut out = self
            .out
            .lock()
            .map_err(|_| EngineError::Internal("output sink poisoned".into()))?;

        let mut logits = vec![0.0f32; vocab_size];
        let mut token = prompt_tokens[0];
        let mut generated = 0usize;
        let start = Instant::now();

        for pos in 0..max_steps {
            let next = match prompt_tokens.get(pos + 1) {
                Some(&forced) => forced,
                None => {
                    logits.copy_from_slice(tokenizer.scores());
                    generated += 1;
                    sampler.sample(&mut logits)
                }
            };
            if next == BOS_TOKEN {
                break;
            }

            let piece = tokenizer.decode(token, next)?;
            if is_printable(piece) {
                out.write_all(piece)?;
                out.flush()?;
            }
            token = next;
        }
        writeln!(out)?;

        let secs = start.elapsed().as_secs_f64();
        let tokens_per_second = if secs > 0.0 {
            generated as f64 / secs
        } else {
            0.0
        };
        Ok(GenerationOutcome {
            tokens_generated: generated,
            tokens_per_second,
        })
    }
}

impl std::fmt::Debug for UnigramEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UnigramEngine").finish_non_exhaustive()
    }
}

/// Single raw bytes are only written if they are printable or whitespace.
fn is_printable(piece: &[u8]) -> bool {
    match piece {
        [] => false,
        [b] => b.is_ascii_graphic() || b.is_ascii_whitespace() || *b >= 0x80,
        _ => true,
    }
}
