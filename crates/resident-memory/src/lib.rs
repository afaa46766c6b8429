// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # resident-memory
//!
//! Byte storage for data that must stay resident for the whole operating
//! life of a device: the model checkpoint and the tokenizer vocabulary.
//!
//! # Key Components
//!
//! - [`MemoryBudget`] — a hard ceiling on resident bytes with human-readable
//!   parsing (`"64M"`, `"1G"`, etc.).
//! - [`ResidencyLedger`] — admits buffers against the budget and tracks how
//!   many bytes are currently resident.
//! - [`ResidentBuffer`] — an owned (or memory-mapped) byte buffer. Dropping
//!   it hands its bytes back to the ledger.
//! - [`ResidencyStats`] — cumulative counters (peak residency, rejections).
//!
//! # Ownership Model
//!
//! ```text
//! ResidencyLedger::read_file(path)
//!       │
//!       ▼
//!   ResidentBuffer  ◄─── owns Vec<u8> or Mmap, holds Arc<LedgerInner>
//!       │
//!       │  drop()
//!       ▼
//!   LedgerInner::release()  ──► resident bytes decremented
//! ```
//!
//! Buffers are loaded once and never reallocated, so there is no free list:
//! a buffer is either resident or gone.
//!
//! # Example
//! ```
//! use resident_memory::{MemoryBudget, ResidencyLedger};
//!
//! let ledger = ResidencyLedger::new(MemoryBudget::from_mb(1));
//! let buf = ledger.adopt("weights", vec![0u8; 4096]).unwrap();
//! assert_eq!(ledger.resident_bytes(), 4096);
//!
//! drop(buf);
//! assert_eq!(ledger.resident_bytes(), 0);
//! ```

mod budget;
mod buffer;
mod error;
mod ledger;
mod stats;

pub use budget::MemoryBudget;
pub use buffer::ResidentBuffer;
pub use error::MemoryError;
pub use ledger::ResidencyLedger;
pub use stats::ResidencyStats;
