// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for board I/O.

/// Errors that can occur when configuring board peripherals.
#[derive(Debug, thiserror::Error)]
pub enum BoardError {
    /// Failed to write a sysfs attribute.
    #[error("failed to write {path}: {source}")]
    WriteError {
        path: String,
        source: std::io::Error,
    },

    /// The expected sysfs path does not exist.
    #[error("sysfs path not found: {path}")]
    NotAvailable { path: String },

    /// An interrupt was configured twice.
    #[error("interrupt already configured")]
    AlreadyConfigured,

    /// A zero debounce window was requested.
    #[error("debounce window must be non-zero")]
    ZeroDebounce,
}
