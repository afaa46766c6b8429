// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Device configuration.
//!
//! On the board these values are compiled in; [`DeviceConfig::default`]
//! holds exactly those constants. Hosts may override any subset of them
//! from a TOML file.
//!
//! # TOML Format
//! ```toml
//! model_path = "/data/stories15M_q80.bin"
//! tokenizer_path = "/data/tokenizer.bin"
//! temperature = 1.0
//! top_p = 0.9
//! max_steps = 256
//! prompt = ""
//! debounce_us = 50000
//! memory_budget = "64M"
//! map_model = false
//! ```

use crate::LifecycleError;
use resident_memory::MemoryBudget;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Full device configuration. Keys missing from a TOML file take the
/// values of [`DeviceConfig::default`].
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    /// Path to the model checkpoint.
    pub model_path: PathBuf,
    /// Path to the tokenizer vocabulary.
    pub tokenizer_path: PathBuf,
    /// Sampling temperature; `0.0` is greedy.
    pub temperature: f32,
    /// Nucleus sampling mass in `(0, 1]`.
    pub top_p: f32,
    /// Step budget per run; `0` means the model's sequence length.
    pub max_steps: usize,
    /// Prompt every story starts from.
    pub prompt: String,
    /// Button debounce window in microseconds.
    pub debounce_us: u64,
    /// Ceiling on resident model + tokenizer bytes (e.g. `"64M"`).
    pub memory_budget: String,
    /// Memory-map the checkpoint instead of copying it into RAM.
    pub map_model: bool,
}

/// The read-only generation parameters derived from a [`DeviceConfig`].
///
/// Built from the config alone, `max_steps` is the configured value. A
/// booted device replaces it with the budget every run actually gets.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationParams {
    pub temperature: f32,
    pub top_p: f32,
    pub max_steps: usize,
    pub prompt: String,
}

fn default_debounce_us() -> u64 {
    board_io::DEFAULT_DEBOUNCE.as_micros() as u64
}

fn default_memory_budget() -> String {
    "64M".to_string()
}

impl DeviceConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, LifecycleError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            LifecycleError::Config(format!("cannot read config '{}': {e}", path.display()))
        })?;
        Self::from_toml(&content)
    }

    /// Parses and validates configuration from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, LifecycleError> {
        let config: Self = toml::from_str(toml_str)
            .map_err(|e| LifecycleError::Config(format!("TOML parse error: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialises configuration to TOML.
    pub fn to_toml(&self) -> Result<String, LifecycleError> {
        toml::to_string_pretty(self)
            .map_err(|e| LifecycleError::Config(format!("TOML serialise error: {e}")))
    }

    /// Checks value ranges.
    pub fn validate(&self) -> Result<(), LifecycleError> {
        if !(self.temperature >= 0.0 && self.temperature.is_finite()) {
            return Err(LifecycleError::Config(format!(
                "temperature must be a non-negative number, got {}",
                self.temperature
            )));
        }
        if !(self.top_p > 0.0 && self.top_p <= 1.0) {
            return Err(LifecycleError::Config(format!(
                "top_p must be in (0, 1], got {}",
                self.top_p
            )));
        }
        if self.debounce_us == 0 {
            return Err(LifecycleError::Config("debounce_us must be non-zero".into()));
        }
        self.parse_budget()?;
        Ok(())
    }

    /// Parses the memory budget string.
    pub fn parse_budget(&self) -> Result<MemoryBudget, LifecycleError> {
        MemoryBudget::parse(&self.memory_budget)
            .map_err(|e| LifecycleError::Config(e.to_string()))
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_micros(self.debounce_us)
    }

    pub fn generation_params(&self) -> GenerationParams {
        GenerationParams {
            temperature: self.temperature,
            top_p: self.top_p,
            max_steps: self.max_steps,
            prompt: self.prompt.clone(),
        }
    }
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("/data/stories15M_q80.bin"),
            tokenizer_path: PathBuf::from("/data/tokenizer.bin"),
            temperature: 1.0,
            top_p: 0.9,
            max_steps: 256,
            prompt: String::new(),
            debounce_us: default_debounce_us(),
            memory_budget: default_memory_budget(),
            map_model: false,
        }
    }
}
