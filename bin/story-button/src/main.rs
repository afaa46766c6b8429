// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # story-button
//!
//! Host front end for the button-triggered story device.
//!
//! ## Usage
//! ```bash
//! # Run the device loop; every line on stdin is a button press
//! story-button run --model ./stories15M.bin --tokenizer ./tokenizer.bin
//!
//! # Same, driving the board LEDs and printing JSON reports
//! story-button run --sysfs-leds --json
//!
//! # Inspect a checkpoint and tokenizer
//! story-button inspect --model ./stories15M.bin --tokenizer ./tokenizer.bin
//!
//! # Print the effective configuration
//! story-button -c device.toml config
//! ```

mod commands;

use clap::{Parser, Subcommand};
use commands::Overrides;

#[derive(Parser)]
#[command(
    name = "story-button",
    about = "Press a button, get a story",
    version,
    author
)]
struct Cli {
    /// Path to a TOML configuration file (CLI flags override its values).
    #[arg(short, long, global = true)]
    config: Option<std::path::PathBuf>,

    /// Enable verbose logging (repeat for more: -v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load the model and generate a story for every button press.
    Run {
        #[command(flatten)]
        overrides: Overrides,

        /// Print one JSON report per run instead of a summary line.
        #[arg(long)]
        json: bool,

        /// Drive the board LEDs through /sys/class/leds.
        #[arg(long)]
        sysfs_leds: bool,

        /// sysfs name of the busy LED.
        #[arg(long, default_value = "ACT")]
        status_led: String,

        /// sysfs name of the armed LED.
        #[arg(long, default_value = "PWR")]
        user_led: String,
    },

    /// Inspect a checkpoint and tokenizer: header, sizes, step budget.
    Inspect {
        #[command(flatten)]
        overrides: Overrides,
    },

    /// Print the effective configuration as TOML.
    Config {
        #[command(flatten)]
        overrides: Overrides,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    commands::init_tracing(cli.verbose);

    match cli.command {
        Commands::Run {
            overrides,
            json,
            sysfs_leds,
            status_led,
            user_led,
        } => {
            let config = commands::load_config(cli.config.as_deref(), overrides)?;
            let leds = sysfs_leds.then_some((status_led, user_led));
            commands::run::execute(config, json, leds).await
        }
        Commands::Inspect { overrides } => {
            let config = commands::load_config(cli.config.as_deref(), overrides)?;
            commands::inspect::execute(config).await
        }
        Commands::Config { overrides } => {
            let config = commands::load_config(cli.config.as_deref(), overrides)?;
            commands::config::execute(config).await
        }
    }
}
