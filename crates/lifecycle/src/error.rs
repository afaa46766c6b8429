// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for the device lifecycle.

use std::fmt;
use std::path::PathBuf;

/// The step of model loading that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadStage {
    ModelFile,
    Transformer,
    TokenizerFile,
    Tokenizer,
}

impl fmt::Display for LoadStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LoadStage::ModelFile => "model file",
            LoadStage::Transformer => "transformer",
            LoadStage::TokenizerFile => "tokenizer file",
            LoadStage::Tokenizer => "tokenizer",
        })
    }
}

/// Underlying cause of a load failure.
#[derive(Debug, thiserror::Error)]
pub enum LoadFailure {
    #[error(transparent)]
    Memory(#[from] resident_memory::MemoryError),

    #[error(transparent)]
    Engine(#[from] story_engine::EngineError),
}

/// Errors raised by the lifecycle controller.
#[derive(Debug, thiserror::Error)]
pub enum LifecycleError {
    /// Invalid configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// Model or tokenizer could not be loaded.
    #[error("failed to load {stage} from '{}': {source}", path.display())]
    Load {
        stage: LoadStage,
        path: PathBuf,
        #[source]
        source: LoadFailure,
    },

    /// The button interrupt could not be configured.
    #[error("interrupt setup failed: {0}")]
    Interrupt(#[from] board_io::BoardError),

    /// A trigger was awaited before the interrupt was bound.
    #[error("trigger awaited before the button interrupt was armed")]
    NotArmed,

    /// A single generation run failed.
    #[error("generation failed: {0}")]
    Generation(String),
}

impl LifecycleError {
    /// Returns `true` for errors that leave the device unable to reach ARMED.
    ///
    /// Boot-fatal errors propagate out of boot; everything else is contained
    /// within one generation run.
    pub fn is_boot_fatal(&self) -> bool {
        !matches!(self, LifecycleError::Generation(_))
    }

    pub(crate) fn load(stage: LoadStage, path: &std::path::Path, source: impl Into<LoadFailure>) -> Self {
        LifecycleError::Load {
            stage,
            path: path.to_path_buf(),
            source: source.into(),
        }
    }
}
