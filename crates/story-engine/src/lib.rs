// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # story-engine
//!
//! The boundary between the device lifecycle controller and whatever
//! actually runs the language model.
//!
//! - [`InferenceEngine`] — the contract the controller programs against.
//!   Engines build opaque handles from *borrowed* byte spans; the caller
//!   keeps ownership of the bytes.
//! - [`ModelSpec`] — the only facts about a model the controller may rely
//!   on: vocabulary size and maximum sequence length.
//! - [`llama2`] — a host reference engine that understands llama2.c
//!   checkpoint and tokenizer files. It has no transformer forward pass;
//!   vocabulary scores stand in for logits, which is enough to exercise the
//!   tokenizer, the nucleus sampler, and the whole device loop on a laptop.

mod contract;
mod error;
pub mod llama2;

pub use contract::{GenerationOutcome, InferenceEngine, ModelSpec, SamplerParams};
pub use error::EngineError;
