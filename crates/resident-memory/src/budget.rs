// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Memory budget configuration and parsing.
//!
//! A [`MemoryBudget`] caps how many bytes may be resident at once. On a
//! microcontroller-class board this is the size of external SDRAM left
//! over after the firmware image.

use crate::MemoryError;
use std::fmt;

const KIB: usize = 1024;
const MIB: usize = 1024 * KIB;
const GIB: usize = 1024 * MIB;

/// Longest suffixes first so `"MB"` is matched before `"B"`.
const SUFFIXES: &[(&str, usize)] = &[
    ("GB", GIB),
    ("MB", MIB),
    ("KB", KIB),
    ("G", GIB),
    ("M", MIB),
    ("K", KIB),
    ("B", 1),
];

/// A hard ceiling on resident bytes.
///
/// # Examples
/// ```
/// use resident_memory::MemoryBudget;
///
/// assert_eq!(MemoryBudget::parse("64M").unwrap().as_mb(), 64);
/// assert_eq!(MemoryBudget::parse("1g").unwrap().as_mb(), 1024);
/// assert_eq!(MemoryBudget::parse("4096").unwrap().as_bytes(), 4096);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct MemoryBudget {
    bytes: usize,
}

impl MemoryBudget {
    /// A budget that admits everything.
    pub const UNLIMITED: Self = Self { bytes: usize::MAX };

    /// Creates a budget from a byte count.
    pub fn from_bytes(bytes: usize) -> Self {
        Self { bytes }
    }

    /// Creates a budget from mebibytes.
    pub fn from_mb(mb: usize) -> Self {
        Self { bytes: mb * MIB }
    }

    /// Returns the budget in bytes.
    pub fn as_bytes(&self) -> usize {
        self.bytes
    }

    /// Returns the budget in mebibytes (truncated).
    pub fn as_mb(&self) -> usize {
        self.bytes / MIB
    }

    /// Parses a budget such as `"64M"`, `"512KB"`, `"1G"` or `"1048576"`.
    /// Suffixes are case-insensitive; zero is rejected.
    pub fn parse(s: &str) -> Result<Self, MemoryError> {
        let trimmed = s.trim();
        let upper = trimmed.to_ascii_uppercase();

        let (digits, multiplier) = SUFFIXES
            .iter()
            .find_map(|(suffix, mult)| {
                upper
                    .strip_suffix(suffix)
                    .map(|rest| (rest.trim_end(), *mult))
            })
            .unwrap_or((upper.as_str(), 1));

        let bytes = digits
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_mul(multiplier))
            .filter(|&b| b > 0)
            .ok_or_else(|| MemoryError::InvalidBudget(trimmed.to_string()))?;

        Ok(Self { bytes })
    }
}

impl fmt::Display for MemoryBudget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.bytes {
            usize::MAX => write!(f, "unlimited"),
            b if b >= GIB && b % GIB == 0 => write!(f, "{} GB", b / GIB),
            b if b >= MIB && b % MIB == 0 => write!(f, "{} MB", b / MIB),
            b if b >= KIB && b % KIB == 0 => write!(f, "{} KB", b / KIB),
            b => write!(f, "{b} B"),
        }
    }
}
