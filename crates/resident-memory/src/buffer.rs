// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! RAII buffer that gives its bytes back to the ledger on drop.

use crate::ledger::LedgerInner;
use std::ops::Deref;
use std::sync::Arc;

pub(crate) enum Backing {
    Owned(Vec<u8>),
    Mapped(memmap2::Mmap),
}

/// Immutable bytes admitted by a [`ResidencyLedger`](crate::ResidencyLedger).
///
/// The buffer dereferences to `[u8]` so it can be lent to a parser as a
/// plain byte span. Contents are never mutated after admission.
pub struct ResidentBuffer {
    label: String,
    backing: Backing,
    size_bytes: usize,
    ledger: Arc<LedgerInner>,
}

impl ResidentBuffer {
    pub(crate) fn new(
        label: &str,
        backing: Backing,
        size_bytes: usize,
        ledger: Arc<LedgerInner>,
    ) -> Self {
        Self {
            label: label.to_string(),
            backing,
            size_bytes,
            ledger,
        }
    }

    /// Name given at admission time (e.g. `"model"`).
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Returns `true` if the bytes are a memory mapping rather than a heap copy.
    pub fn is_mapped(&self) -> bool {
        matches!(self.backing, Backing::Mapped(_))
    }

    /// Returns the bytes.
    pub fn as_bytes(&self) -> &[u8] {
        match &self.backing {
            Backing::Owned(v) => v.as_slice(),
            Backing::Mapped(m) => &m[..],
        }
    }
}

impl Deref for ResidentBuffer {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl AsRef<[u8]> for ResidentBuffer {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl Drop for ResidentBuffer {
    fn drop(&mut self) {
        tracing::debug!(label = %self.label, bytes = self.size_bytes, "buffer released");
        self.ledger.release(self.size_bytes);
    }
}

impl std::fmt::Debug for ResidentBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResidentBuffer")
            .field("label", &self.label)
            .field("size_bytes", &self.size_bytes)
            .field("mapped", &self.is_mapped())
            .finish()
    }
}
