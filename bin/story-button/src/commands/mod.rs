// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Subcommand implementations and shared CLI plumbing.

pub mod config;
pub mod inspect;
pub mod run;

use lifecycle::DeviceConfig;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Per-field overrides applied on top of the config file (or defaults).
#[derive(Debug, Default, clap::Args)]
pub struct Overrides {
    /// Path to the model checkpoint.
    #[arg(short, long)]
    model: Option<PathBuf>,

    /// Path to the tokenizer.
    #[arg(short, long)]
    tokenizer: Option<PathBuf>,

    /// Sampling temperature (0 = greedy).
    #[arg(long)]
    temperature: Option<f32>,

    /// Nucleus sampling mass in (0, 1].
    #[arg(long)]
    top_p: Option<f32>,

    /// Steps per story (0 = the model's sequence length).
    #[arg(short = 'n', long)]
    steps: Option<usize>,

    /// Prompt every story starts from.
    #[arg(short, long)]
    prompt: Option<String>,

    /// Memory budget for model + tokenizer (e.g. "64M").
    #[arg(short = 'b', long)]
    memory_budget: Option<String>,

    /// Button debounce window in microseconds.
    #[arg(long)]
    debounce_us: Option<u64>,

    /// Memory-map the checkpoint instead of reading it.
    #[arg(long)]
    mmap: bool,
}

impl Overrides {
    fn apply(self, config: &mut DeviceConfig) {
        if let Some(v) = self.model {
            config.model_path = v;
        }
        if let Some(v) = self.tokenizer {
            config.tokenizer_path = v;
        }
        if let Some(v) = self.temperature {
            config.temperature = v;
        }
        if let Some(v) = self.top_p {
            config.top_p = v;
        }
        if let Some(v) = self.steps {
            config.max_steps = v;
        }
        if let Some(v) = self.prompt {
            config.prompt = v;
        }
        if let Some(v) = self.memory_budget {
            config.memory_budget = v;
        }
        if let Some(v) = self.debounce_us {
            config.debounce_us = v;
        }
        if self.mmap {
            config.map_model = true;
        }
    }
}

/// Builds the effective configuration: file (or built-in defaults), then
/// CLI overrides, then validation.
pub fn load_config(path: Option<&Path>, overrides: Overrides) -> anyhow::Result<DeviceConfig> {
    let mut config = match path {
        Some(p) => DeviceConfig::from_file(p)?,
        None => DeviceConfig::default(),
    };
    overrides.apply(&mut config);
    config.validate()?;
    Ok(config)
}

/// Initialises the tracing subscriber.
///
/// `RUST_LOG` wins when set; otherwise verbosity maps to a level.
pub fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Truncates a string with ellipsis.
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}
