// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! llama2.c checkpoint headers.
//!
//! Three layouts exist in the wild:
//!
//! | format | header | weights |
//! |---|---|---|
//! | legacy | 7 × i32 (28 bytes) | f32, with RoPE tables |
//! | v1 | magic, version, 7 × i32, shared flag, padded to 256 | f32 |
//! | v2 (`*_q80.bin`) | as v1 plus `group_size` | int8 groups + f32 scales |
//!
//! In the legacy header a negative vocabulary size marks an unshared
//! classifier.

use super::read_i32;
use crate::{EngineError, ModelSpec};

/// `"ak42"` read as a little-endian `u32`.
pub const CHECKPOINT_MAGIC: u32 = 0x616b_3432;

const LEGACY_HEADER_BYTES: usize = 28;
const VERSIONED_HEADER_BYTES: usize = 256;

/// How the weights following the header are encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum CheckpointFormat {
    Legacy,
    Float32,
    Int8 { group_size: usize },
}

/// Transformer hyper-parameters read from a checkpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct CheckpointHeader {
    pub dim: usize,
    pub hidden_dim: usize,
    pub n_layers: usize,
    pub n_heads: usize,
    pub n_kv_heads: usize,
    pub vocab_size: usize,
    pub seq_len: usize,
    pub shared_classifier: bool,
    pub format: CheckpointFormat,
}

impl CheckpointHeader {
    /// Parses and validates the header at the start of `bytes`.
    pub fn parse(bytes: &[u8]) -> Result<Self, EngineError> {
        let first = read_i32(bytes, 0, "checkpoint header")? as u32;
        if first == CHECKPOINT_MAGIC {
            Self::parse_versioned(bytes)
        } else {
            Self::parse_legacy(bytes)
        }
    }

    fn parse_legacy(bytes: &[u8]) -> Result<Self, EngineError> {
        let f = dims(bytes, 0)?;
        let vocab = f[5];
        let header = Self {
            dim: positive("dim", f[0])?,
            hidden_dim: positive("hidden_dim", f[1])?,
            n_layers: positive("n_layers", f[2])?,
            n_heads: positive("n_heads", f[3])?,
            n_kv_heads: positive("n_kv_heads", f[4])?,
            vocab_size: positive("vocab_size", vocab.checked_abs().unwrap_or(0))?,
            seq_len: positive("seq_len", f[6])?,
            shared_classifier: vocab > 0,
            format: CheckpointFormat::Legacy,
        };
        header.check_heads()?;
        Ok(header)
    }

    fn parse_versioned(bytes: &[u8]) -> Result<Self, EngineError> {
        let version = read_i32(bytes, 4, "checkpoint header")?;
        if bytes.len() < VERSIONED_HEADER_BYTES {
            return Err(EngineError::Truncated {
                what: "checkpoint header",
                needed: VERSIONED_HEADER_BYTES,
                actual: bytes.len(),
            });
        }
        let f = dims(bytes, 8)?;
        let shared_classifier = bytes[36] != 0;

        let format = match version {
            1 => CheckpointFormat::Float32,
            2 => {
                let group = read_i32(bytes, 37, "checkpoint header")?;
                CheckpointFormat::Int8 {
                    group_size: positive("group_size", group)?,
                }
            }
            other => return Err(EngineError::UnsupportedVersion(other)),
        };

        let header = Self {
            dim: positive("dim", f[0])?,
            hidden_dim: positive("hidden_dim", f[1])?,
            n_layers: positive("n_layers", f[2])?,
            n_heads: positive("n_heads", f[3])?,
            n_kv_heads: positive("n_kv_heads", f[4])?,
            vocab_size: positive("vocab_size", f[5])?,
            seq_len: positive("seq_len", f[6])?,
            shared_classifier,
            format,
        };
        header.check_heads()?;
        if let CheckpointFormat::Int8 { group_size } = format {
            if header.dim % group_size != 0 {
                return Err(EngineError::InvalidDimension {
                    field: "group_size",
                    value: group_size as i64,
                });
            }
        }
        Ok(header)
    }

    fn check_heads(&self) -> Result<(), EngineError> {
        if self.dim % self.n_heads != 0 {
            return Err(EngineError::InvalidDimension {
                field: "n_heads",
                value: self.n_heads as i64,
            });
        }
        if self.n_kv_heads > self.n_heads || self.n_heads % self.n_kv_heads != 0 {
            return Err(EngineError::InvalidDimension {
                field: "n_kv_heads",
                value: self.n_kv_heads as i64,
            });
        }
        Ok(())
    }

    /// Size of the header in bytes.
    pub fn header_bytes(&self) -> usize {
        match self.format {
            CheckpointFormat::Legacy => LEGACY_HEADER_BYTES,
            _ => VERSIONED_HEADER_BYTES,
        }
    }

    /// Minimum number of weight bytes that must follow the header.
    ///
    /// Exact for the float formats. For int8 checkpoints only the
    /// quantized payload is counted, not the per-group scales.
    pub fn min_weight_bytes(&self) -> u128 {
        let dim = self.dim as u128;
        let hidden = self.hidden_dim as u128;
        let layers = self.n_layers as u128;
        let vocab = self.vocab_size as u128;
        let head_size = dim / self.n_heads as u128;
        let kv_dim = head_size * self.n_kv_heads as u128;

        let matrices = vocab * dim
            + layers * (2 * dim * dim + 2 * dim * kv_dim + 3 * dim * hidden)
            + if self.shared_classifier { 0 } else { vocab * dim };
        let norms = layers * 2 * dim + dim;

        match self.format {
            CheckpointFormat::Legacy => {
                let rope = self.seq_len as u128 * head_size;
                4 * (matrices + norms + rope)
            }
            CheckpointFormat::Float32 => 4 * (matrices + norms),
            CheckpointFormat::Int8 { .. } => matrices + 4 * norms,
        }
    }

    pub fn spec(&self) -> ModelSpec {
        ModelSpec {
            vocab_size: self.vocab_size,
            seq_len: self.seq_len,
        }
    }
}

/// A parsed checkpoint: the header plus the size of the weight payload.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct Checkpoint {
    pub header: CheckpointHeader,
    pub weight_bytes: usize,
}

impl Checkpoint {
    /// Parses a checkpoint and checks that the weight payload is complete.
    pub fn parse(bytes: &[u8]) -> Result<Self, EngineError> {
        let header = CheckpointHeader::parse(bytes)?;
        let weight_bytes = bytes.len().saturating_sub(header.header_bytes());
        let needed = header.min_weight_bytes();
        if (weight_bytes as u128) < needed {
            return Err(EngineError::Truncated {
                what: "checkpoint weights",
                needed: usize::try_from(needed).unwrap_or(usize::MAX),
                actual: weight_bytes,
            });
        }
        Ok(Self {
            header,
            weight_bytes,
        })
    }

    pub fn spec(&self) -> ModelSpec {
        self.header.spec()
    }
}

fn dims(bytes: &[u8], offset: usize) -> Result<[i32; 7], EngineError> {
    let mut out = [0i32; 7];
    for (i, slot) in out.iter_mut().enumerate() {
        *slot = read_i32(bytes, offset + 4 * i, "checkpoint header")?;
    }
    Ok(out)
}

fn positive(field: &'static str, value: i32) -> Result<usize, EngineError> {
    if value > 0 {
        Ok(value as usize)
    } else {
        Err(EngineError::InvalidDimension {
            field,
            value: value as i64,
        })
    }
}
