// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Millisecond tick counter since first use.

use std::sync::OnceLock;
use std::time::Instant;

static BOOT: OnceLock<Instant> = OnceLock::new();

/// Milliseconds elapsed since the first call in this process.
///
/// Never decreases. Not a source of entropy: two boots that reach the same
/// point after the same delay will read the same value.
pub fn boot_ticks() -> u64 {
    let boot = BOOT.get_or_init(Instant::now);
    boot.elapsed().as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_monotonic() {
        let a = boot_ticks();
        std::thread::sleep(std::time::Duration::from_millis(3));
        let b = boot_ticks();
        assert!(b >= a + 2);
    }
}
