// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! llama2.c tokenizer vocabulary: parsing, BPE encoding, and decoding.
//!
//! File layout (little-endian):
//! ```text
//! i32 max_token_length
//! repeat vocab_size times:
//!     f32 score
//!     i32 len
//!     u8[len] piece
//! ```

use super::{read_f32, read_i32, BOS_TOKEN};
use crate::EngineError;
use std::collections::HashMap;

/// Byte-fallback tokens `<0x00>..<0xFF>` start at this id.
const BYTE_TOKEN_OFFSET: usize = 3;

/// A parsed tokenizer vocabulary.
#[derive(Debug, Clone)]
pub struct Vocabulary {
    pieces: Vec<Vec<u8>>,
    scores: Vec<f32>,
    lookup: HashMap<Vec<u8>, usize>,
    max_token_length: usize,
    single_bytes: [u8; 256],
}

impl Vocabulary {
    /// Parses `vocab_size` entries from a tokenizer file.
    pub fn parse(bytes: &[u8], vocab_size: usize) -> Result<Self, EngineError> {
        if vocab_size == 0 {
            return Err(EngineError::MalformedTokenizer("empty vocabulary".into()));
        }
        let max_len = read_i32(bytes, 0, "tokenizer header")?;
        let max_token_length = usize::try_from(max_len).map_err(|_| {
            EngineError::MalformedTokenizer(format!("negative max_token_length {max_len}"))
        })?;

        let mut pieces = Vec::with_capacity(vocab_size);
        let mut scores = Vec::with_capacity(vocab_size);
        let mut offset = 4;

        for id in 0..vocab_size {
            let score = read_f32(bytes, offset, "tokenizer entry")?;
            let len = read_i32(bytes, offset + 4, "tokenizer entry")?;
            let len = usize::try_from(len).map_err(|_| {
                EngineError::MalformedTokenizer(format!("token {id} has negative length {len}"))
            })?;
            offset += 8;

            let piece = bytes.get(offset..offset + len).ok_or(EngineError::Truncated {
                what: "tokenizer entry",
                needed: offset + len,
                actual: bytes.len(),
            })?;
            offset += len;

            scores.push(score);
            pieces.push(piece.to_vec());
        }

        let lookup = pieces
            .iter()
            .enumerate()
            .map(|(id, p)| (p.clone(), id))
            .collect();

        let mut single_bytes = [0u8; 256];
        for (i, b) in single_bytes.iter_mut().enumerate() {
            *b = i as u8;
        }

        tracing::debug!(vocab_size, max_token_length, "tokenizer parsed");
        Ok(Self {
            pieces,
            scores,
            lookup,
            max_token_length,
            single_bytes,
        })
    }

    pub fn len(&self) -> usize {
        self.pieces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pieces.is_empty()
    }

    pub fn max_token_length(&self) -> usize {
        self.max_token_length
    }

    /// Merge scores, one per token.
    pub fn scores(&self) -> &[f32] {
        &self.scores
    }

    /// Returns the raw piece for `token`.
    pub fn piece(&self, token: usize) -> Option<&[u8]> {
        self.pieces.get(token).map(Vec::as_slice)
    }

    /// Decodes `token` following `prev`.
    ///
    /// A leading space is dropped right after BOS, and `<0xHH>` pieces
    /// decode to the raw byte they name.
    pub fn decode(&self, prev: usize, token: usize) -> Result<&[u8], EngineError> {
        let mut piece = self.piece(token).ok_or(EngineError::TokenOutOfRange {
            token,
            vocab_size: self.len(),
        })?;
        if prev == BOS_TOKEN && piece.first() == Some(&b' ') {
            piece = &piece[1..];
        }
        Ok(match byte_token(piece) {
            Some(b) => std::slice::from_ref(&self.single_bytes[b as usize]),
            None => piece,
        })
    }

    /// Encodes `text` with a leading BOS and greedy highest-score BPE merges.
    ///
    /// A non-empty text gets the dummy-prefix space token first. Characters
    /// missing from the vocabulary fall back to byte tokens.
    pub fn encode(&self, text: &str) -> Vec<usize> {
        let mut tokens = vec![BOS_TOKEN];
        if text.is_empty() {
            return tokens;
        }
        if let Some(&space) = self.lookup.get(b" ".as_slice()) {
            tokens.push(space);
        }

        let mut buf = [0u8; 4];
        for c in text.chars() {
            let encoded = c.encode_utf8(&mut buf).as_bytes();
            match self.lookup.get(encoded) {
                Some(&id) => tokens.push(id),
                None => tokens.extend(
                    encoded
                        .iter()
                        .map(|&b| b as usize + BYTE_TOKEN_OFFSET)
                        .filter(|&id| id < self.len()),
                ),
            }
        }

        let mut merged = Vec::with_capacity(2 * self.max_token_length.max(1));
        loop {
            let mut best: Option<(f32, usize, usize)> = None;
            for i in 1..tokens.len().saturating_sub(1) {
                merged.clear();
                merged.extend_from_slice(&self.pieces[tokens[i]]);
                merged.extend_from_slice(&self.pieces[tokens[i + 1]]);
                if let Some(&id) = self.lookup.get(merged.as_slice()) {
                    let score = self.scores[id];
                    if best.map_or(true, |(s, _, _)| score > s) {
                        best = Some((score, id, i));
                    }
                }
            }
            match best {
                Some((_, id, i)) => {
                    tokens[i] = id;
                    tokens.remove(i + 1);
                }
                None => break,
            }
        }
        tokens
    }
}

/// Parses pieces of the form `<0xHH>`.
fn byte_token(piece: &[u8]) -> Option<u8> {
    if piece.len() != 6 || !piece.starts_with(b"<0x") || piece[5] != b'>' {
        return None;
    }
    let hex = std::str::from_utf8(&piece[3..5]).ok()?;
    u8::from_str_radix(hex, 16).ok()
}
