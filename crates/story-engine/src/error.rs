// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types reported by inference engines.

/// Errors an engine can report while building state or generating.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The checkpoint does not start with a recognised magic number.
    #[error("unrecognised checkpoint magic 0x{0:08x}")]
    BadMagic(u32),

    /// The checkpoint format version is not supported.
    #[error("unsupported checkpoint version {0}")]
    UnsupportedVersion(i32),

    /// A buffer ended before a structure was complete.
    #[error("{what} truncated: need {needed} bytes, have {actual}")]
    Truncated {
        what: &'static str,
        needed: usize,
        actual: usize,
    },

    /// A header field holds a value the engine cannot work with.
    #[error("invalid model dimension {field} = {value}")]
    InvalidDimension { field: &'static str, value: i64 },

    /// The tokenizer file could not be parsed.
    #[error("malformed tokenizer: {0}")]
    MalformedTokenizer(String),

    /// A token id fell outside the vocabulary during generation.
    #[error("token id {token} out of range for vocabulary of {vocab_size}")]
    TokenOutOfRange { token: usize, vocab_size: usize },

    /// Writing generated text failed.
    #[error("output error: {0}")]
    Output(#[from] std::io::Error),

    /// Any other engine-internal failure.
    #[error("engine failure: {0}")]
    Internal(String),
}
