// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Residency statistics for diagnostics.

/// Cumulative counters describing how the ledger has been used.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct ResidencyStats {
    /// Buffers admitted since the ledger was created.
    pub buffers_admitted: u64,
    /// Buffers released (dropped) since the ledger was created.
    pub buffers_released: u64,
    /// Admission requests refused because of the budget.
    pub rejections: u64,
    /// Highest number of bytes resident at any one time.
    pub peak_resident_bytes: usize,
}

impl ResidencyStats {
    pub(crate) fn record_admission(&mut self, resident_after: usize) {
        self.buffers_admitted += 1;
        self.peak_resident_bytes = self.peak_resident_bytes.max(resident_after);
    }

    pub(crate) fn record_release(&mut self) {
        self.buffers_released += 1;
    }

    pub(crate) fn record_rejection(&mut self) {
        self.rejections += 1;
    }

    /// Number of buffers currently alive.
    pub fn live_buffers(&self) -> u64 {
        self.buffers_admitted - self.buffers_released
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_live_buffers() {
        let mut s = ResidencyStats::default();
        s.record_admission(100);
        s.record_admission(300);
        s.record_release();
        assert_eq!(s.live_buffers(), 1);
        assert_eq!(s.peak_resident_bytes, 300);
    }
}
