// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! LED class devices under `/sys/class/leds/`.
//!
//! Each LED exposes a `brightness` attribute; writing `1` turns it on and
//! `0` turns it off. On boards without the named LED the driver degrades
//! to logging.

use crate::{BoardError, Indicators, Led};
use std::path::{Path, PathBuf};

/// Root of the Linux LED class.
const LED_CLASS_ROOT: &str = "/sys/class/leds";

/// One sysfs LED.
#[derive(Debug, Clone)]
pub struct SysfsLed {
    brightness: PathBuf,
    /// Set after the first failed write so the log is not flooded.
    failed: bool,
}

impl SysfsLed {
    /// Opens `/sys/class/leds/<name>/brightness`.
    pub fn named(name: &str) -> Result<Self, BoardError> {
        Self::at(&Path::new(LED_CLASS_ROOT).join(name))
    }

    /// Opens the LED whose class directory is `dir`.
    pub fn at(dir: &Path) -> Result<Self, BoardError> {
        let brightness = dir.join("brightness");
        if !brightness.exists() {
            return Err(BoardError::NotAvailable {
                path: brightness.display().to_string(),
            });
        }
        Ok(Self {
            brightness,
            failed: false,
        })
    }

    /// Writes the brightness attribute.
    pub fn write(&self, on: bool) -> Result<(), BoardError> {
        write_sysfs_file(&self.brightness, if on { "1" } else { "0" })
    }
}

/// Status and user LEDs backed by sysfs.
#[derive(Debug, Clone)]
pub struct SysfsIndicators {
    status: Option<SysfsLed>,
    user: Option<SysfsLed>,
}

impl SysfsIndicators {
    /// Opens both LEDs by name. A missing LED is logged and left dark.
    pub fn open(status_name: &str, user_name: &str) -> Self {
        let open = |name: &str| match SysfsLed::named(name) {
            Ok(led) => Some(led),
            Err(e) => {
                tracing::warn!("indicator '{name}' unavailable: {e}");
                None
            }
        };
        Self {
            status: open(status_name),
            user: open(user_name),
        }
    }

    /// Builds indicators from already-opened LEDs.
    pub fn from_leds(status: Option<SysfsLed>, user: Option<SysfsLed>) -> Self {
        Self { status, user }
    }
}

impl Indicators for SysfsIndicators {
    fn set(&mut self, led: Led, on: bool) {
        let target = match led {
            Led::Status => self.status.as_mut(),
            Led::User => self.user.as_mut(),
        };
        let Some(target) = target else {
            tracing::debug!(led = %led, on, "indicator (no device)");
            return;
        };
        match target.write(on) {
            Ok(()) => target.failed = false,
            Err(e) if !target.failed => {
                tracing::warn!("indicator {led}: {e}");
                target.failed = true;
            }
            Err(_) => {}
        }
    }
}

/// Writes `value` to a sysfs attribute.
pub(crate) fn write_sysfs_file(path: &Path, value: &str) -> Result<(), BoardError> {
    std::fs::write(path, value).map_err(|e| BoardError::WriteError {
        path: path.display().to_string(),
        source: e,
    })
}
