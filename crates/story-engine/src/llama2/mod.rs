// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Host reference engine for llama2.c model and tokenizer files.
//!
//! ```text
//! checkpoint bytes ──► Checkpoint   (header + weight size check)
//! tokenizer bytes  ──► Vocabulary   (pieces, merge scores)
//! seed             ──► Sampler      (temperature, top-p, xorshift RNG)
//!                        │
//!                        ▼
//!              UnigramEngine::generate ──► text on the output sink
//! ```

mod checkpoint;
mod engine;
mod sampler;
mod vocab;

pub use checkpoint::{Checkpoint, CheckpointFormat, CheckpointHeader};
pub use engine::UnigramEngine;
pub use sampler::Sampler;
pub use vocab::Vocabulary;

/// Beginning-of-sequence token id used by llama2.c tokenizers.
pub const BOS_TOKEN: usize = 1;

/// Reads a little-endian `i32` at `offset`.
pub(crate) fn read_i32(bytes: &[u8], offset: usize, what: &'static str) -> Result<i32, crate::EngineError> {
    bytes
        .get(offset..offset + 4)
        .and_then(|s| s.try_into().ok())
        .map(i32::from_le_bytes)
        .ok_or(crate::EngineError::Truncated {
            what,
            needed: offset + 4,
            actual: bytes.len(),
        })
}

/// Reads a little-endian `f32` at `offset`.
pub(crate) fn read_f32(bytes: &[u8], offset: usize, what: &'static str) -> Result<f32, crate::EngineError> {
    read_i32(bytes, offset, what).map(|v| f32::from_bits(v as u32))
}
