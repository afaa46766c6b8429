// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Budget-enforcing ledger of resident buffers.
//!
//! The [`ResidencyLedger`] is the only way to create a [`ResidentBuffer`].
//! Admission reserves the buffer's size against the budget *before* any
//! file is read, so an oversized checkpoint is rejected without first
//! being pulled into RAM.
//!
//! # Thread Safety
//! `ResidencyLedger` is `Send + Sync`. Reservations use a compare-and-swap
//! loop on the resident byte counter; statistics sit behind a `Mutex`
//! because they are only touched at admission and release time.

use crate::buffer::Backing;
use crate::{MemoryBudget, MemoryError, ResidencyStats, ResidentBuffer};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// State shared between the ledger and every buffer it admitted.
#[derive(Debug)]
pub(crate) struct LedgerInner {
    budget: MemoryBudget,
    resident_bytes: AtomicUsize,
    stats: Mutex<ResidencyStats>,
}

impl LedgerInner {
    /// Reserves `size` bytes or reports how much room is left.
    fn reserve(&self, label: &str, size: usize) -> Result<(), MemoryError> {
        let budget = self.budget.as_bytes();
        let reserved = self
            .resident_bytes
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                current.checked_add(size).filter(|&next| next <= budget)
            });

        match reserved {
            Ok(previous) => {
                if let Ok(mut stats) = self.stats.lock() {
                    stats.record_admission(previous + size);
                }
                Ok(())
            }
            Err(current) => {
                if let Ok(mut stats) = self.stats.lock() {
                    stats.record_rejection();
                }
                Err(MemoryError::OverBudget {
                    label: label.to_string(),
                    requested_bytes: size,
                    available_bytes: budget.saturating_sub(current),
                    budget_bytes: budget,
                })
            }
        }
    }

    /// Called by `ResidentBuffer::drop`.
    pub(crate) fn release(&self, size: usize) {
        self.resident_bytes.fetch_sub(size, Ordering::AcqRel);
        if let Ok(mut stats) = self.stats.lock() {
            stats.record_release();
        }
    }
}

/// Admits buffers against a [`MemoryBudget`] and tracks residency.
///
/// Cloning a ledger yields another handle onto the same accounting.
#[derive(Debug, Clone)]
pub struct ResidencyLedger {
    inner: Arc<LedgerInner>,
}

impl ResidencyLedger {
    /// Creates an empty ledger with the given budget.
    pub fn new(budget: MemoryBudget) -> Self {
        Self {
            inner: Arc::new(LedgerInner {
                budget,
                resident_bytes: AtomicUsize::new(0),
                stats: Mutex::new(ResidencyStats::default()),
            }),
        }
    }

    /// Returns the configured budget.
    pub fn budget(&self) -> MemoryBudget {
        self.inner.budget
    }

    /// Bytes held by buffers that are still alive.
    pub fn resident_bytes(&self) -> usize {
        self.inner.resident_bytes.load(Ordering::Acquire)
    }

    /// Returns a snapshot of the cumulative statistics.
    pub fn stats(&self) -> ResidencyStats {
        self.inner
            .stats
            .lock()
            .map(|s| s.clone())
            .unwrap_or_default()
    }

    /// Reads a whole file into a freshly allocated resident buffer.
    pub fn read_file(&self, label: &str, path: &Path) -> Result<ResidentBuffer, MemoryError> {
        let size = file_len(path)?;
        self.inner.reserve(label, size)?;

        match std::fs::read(path) {
            Ok(bytes) if bytes.len() == size => {
                tracing::debug!(label, bytes = size, path = %path.display(), "buffer read");
                Ok(ResidentBuffer::new(
                    label,
                    Backing::Owned(bytes),
                    size,
                    Arc::clone(&self.inner),
                ))
            }
            Ok(bytes) => {
                // The file changed under us; account for what was actually read.
                self.inner.release(size);
                self.adopt(label, bytes)
            }
            Err(source) => {
                self.inner.release(size);
                Err(MemoryError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        }
    }

    /// Memory-maps a file as a resident buffer.
    ///
    /// The mapping is read-only and counts against the budget at its full
    /// length even though pages are faulted in lazily.
    pub fn map_file(&self, label: &str, path: &Path) -> Result<ResidentBuffer, MemoryError> {
        let size = file_len(path)?;
        let file = std::fs::File::open(path).map_err(|source| MemoryError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        // SAFETY: the mapping is read-only and the checkpoint is not
        // expected to be modified while the device is running.
        let mmap = unsafe { memmap2::Mmap::map(&file) }.map_err(|source| MemoryError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        self.inner.reserve(label, size)?;
        tracing::debug!(label, bytes = size, path = %path.display(), "buffer mapped");
        Ok(ResidentBuffer::new(
            label,
            Backing::Mapped(mmap),
            size,
            Arc::clone(&self.inner),
        ))
    }

    /// Takes ownership of bytes that were produced elsewhere.
    pub fn adopt(&self, label: &str, bytes: Vec<u8>) -> Result<ResidentBuffer, MemoryError> {
        let size = bytes.len();
        self.inner.reserve(label, size)?;
        Ok(ResidentBuffer::new(
            label,
            Backing::Owned(bytes),
            size,
            Arc::clone(&self.inner),
        ))
    }
}

fn file_len(path: &Path) -> Result<usize, MemoryError> {
    let meta = std::fs::metadata(path).map_err(|source| MemoryError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    match meta.len() {
        0 => Err(MemoryError::EmptyFile {
            path: path.to_path_buf(),
        }),
        len => Ok(len as usize),
    }
}
