// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `story-button run`: the device loop on a host.
//!
//! ```text
//! boot (LOADING) → ARMED ─press─► GENERATING ─► ARMED ─press─► ...
//! ```
//!
//! Each line read from stdin is one button press. Presses go through the
//! same debouncer and wake token as the board's interrupt, so a line sent
//! while a story is being generated is dropped. Closing stdin stops the
//! loop and unloads the model.

use super::truncate;
use board_io::{HostButton, Indicators, LogIndicators, SysfsIndicators};
use lifecycle::{DeviceConfig, DeviceController, GenerationReport};
use std::io::BufRead;
use story_engine::llama2::UnigramEngine;
use tokio::sync::oneshot;

pub async fn execute(
    config: DeviceConfig,
    json: bool,
    sysfs_leds: Option<(String, String)>,
) -> anyhow::Result<()> {
    println!("╔══════════════════════════════════════════════════════╗");
    println!("║              story-button · Device Loop             ║");
    println!("╚══════════════════════════════════════════════════════╝");
    println!();

    println!("  Config:");
    println!("   Model:       {}", config.model_path.display());
    println!("   Tokenizer:   {}", config.tokenizer_path.display());
    println!("   Temperature: {}", config.temperature);
    println!("   Top-p:       {}", config.top_p);
    println!("   Steps:       {}", config.max_steps);
    println!("   Prompt:      \"{}\"", truncate(&config.prompt, 50));
    println!("   Budget:      {}", config.memory_budget);
    println!();

    let indicators: Box<dyn Indicators> = match sysfs_leds {
        Some((status, user)) => Box::new(SysfsIndicators::open(&status, &user)),
        None => Box::new(LogIndicators::new()),
    };
    let button = HostButton::new();
    let line = button.line();

    // ── Boot ───────────────────────────────────────────────────
    println!("  Loading model...");
    let mut device = DeviceController::boot(config, UnigramEngine::stdout(), indicators, button)?;
    println!("   {}", device.load_metrics().summary());
    let params = device.params();
    println!(
        "   Each story: up to {} steps, temperature {}, top-p {}",
        params.max_steps, params.temperature, params.top_p
    );
    println!();
    println!("  Armed. Press Enter for a story, Ctrl-D to stop.");
    println!();

    // ── Button feed ────────────────────────────────────────────
    let (eof_tx, mut eof_rx) = oneshot::channel::<()>();
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for input in stdin.lock().lines() {
            if input.is_err() {
                break;
            }
            line.press();
        }
        let _ = eof_tx.send(());
    });

    // ── Loop ───────────────────────────────────────────────────
    loop {
        tokio::select! {
            report = device.run_cycle() => print_report(&report?, json)?,
            _ = &mut eof_rx => break,
        }
    }

    let stats = device.stats();
    let latch = device.latch_stats();
    println!();
    println!("  Session:");
    println!("   Triggers:  {} handled, {} dropped", stats.triggers_handled, latch.dropped);
    println!("   Runs:      {} completed, {} failed", stats.runs_completed, stats.runs_failed);

    let unloaded = device.shutdown();
    tracing::debug!(resident_bytes = unloaded.resident_bytes(), "model unloaded");
    Ok(())
}

fn print_report(report: &GenerationReport, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string(report)?);
    } else {
        println!("  {}", report.summary());
        println!();
    }
    Ok(())
}
