// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for resident buffer management.

use std::path::PathBuf;

/// Errors that can occur while admitting buffers into resident memory.
#[derive(Debug, thiserror::Error)]
pub enum MemoryError {
    /// Admitting the buffer would exceed the memory budget.
    #[error("'{label}' needs {requested_bytes} bytes, but only {available_bytes} of {budget_bytes} remain")]
    OverBudget {
        label: String,
        requested_bytes: usize,
        available_bytes: usize,
        budget_bytes: usize,
    },

    /// The backing file could not be opened, read, or mapped.
    #[error("cannot load '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The backing file exists but contains no data.
    #[error("'{}' is empty", path.display())]
    EmptyFile { path: PathBuf },

    /// A budget string could not be parsed.
    #[error("invalid memory budget '{0}': expected a positive number with an optional K/M/G suffix")]
    InvalidBudget(String),
}
