// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `story-button config`: print the effective configuration.

use lifecycle::DeviceConfig;

pub async fn execute(config: DeviceConfig) -> anyhow::Result<()> {
    print!("{}", config.to_toml()?);
    Ok(())
}
