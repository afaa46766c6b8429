// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `story-button inspect`: checkpoint and tokenizer summary.
//!
//! Parses both files exactly as boot would and prints what the device
//! would run with, without arming anything.

use super::truncate;
use lifecycle::DeviceConfig;
use story_engine::llama2::{Checkpoint, CheckpointFormat, Vocabulary};

pub async fn execute(config: DeviceConfig) -> anyhow::Result<()> {
    println!("╔══════════════════════════════════════════════════════╗");
    println!("║             story-button · Model Inspector          ║");
    println!("╚══════════════════════════════════════════════════════╝");
    println!();

    let model_bytes = std::fs::read(&config.model_path).map_err(|e| {
        anyhow::anyhow!("failed to read model '{}': {e}", config.model_path.display())
    })?;
    let ckpt = Checkpoint::parse(&model_bytes)?;
    let h = &ckpt.header;

    // ── Checkpoint ─────────────────────────────────────────────
    println!("  Checkpoint: {}", config.model_path.display());
    let format = match h.format {
        CheckpointFormat::Legacy => "legacy fp32".to_string(),
        CheckpointFormat::Float32 => "v1 fp32".to_string(),
        CheckpointFormat::Int8 { group_size } => format!("v2 int8 (group size {group_size})"),
    };
    println!("   Format:      {format}");
    println!("   dim:         {}", h.dim);
    println!("   hidden_dim:  {}", h.hidden_dim);
    println!("   n_layers:    {}", h.n_layers);
    println!("   n_heads:     {} ({} kv)", h.n_heads, h.n_kv_heads);
    println!("   vocab_size:  {}", h.vocab_size);
    println!("   seq_len:     {}", h.seq_len);
    println!("   Classifier:  {}", if h.shared_classifier { "shared" } else { "separate" });
    println!(
        "   Weights:     {:.2} MB",
        ckpt.weight_bytes as f64 / (1024.0 * 1024.0),
    );
    println!();

    // ── Tokenizer ──────────────────────────────────────────────
    let tokenizer_bytes = std::fs::read(&config.tokenizer_path).map_err(|e| {
        anyhow::anyhow!(
            "failed to read tokenizer '{}': {e}",
            config.tokenizer_path.display()
        )
    })?;
    let vocab = Vocabulary::parse(&tokenizer_bytes, h.vocab_size)?;
    println!("  Tokenizer: {}", config.tokenizer_path.display());
    println!("   Tokens:      {}", vocab.len());
    println!("   Max length:  {} bytes", vocab.max_token_length());
    let preview: Vec<String> = (0..vocab.len().min(8))
        .filter_map(|id| vocab.piece(id))
        .map(|p| format!("{:?}", String::from_utf8_lossy(p)))
        .collect();
    println!("   First:       {}", truncate(&preview.join(" "), 60));
    println!();

    // ── Run Budget ─────────────────────────────────────────────
    let spec = ckpt.spec();
    let steps = spec.clamp_steps(config.max_steps);
    println!("  Run Budget:");
    println!("   Configured:  {}", config.max_steps);
    println!("   Effective:   {steps}  (clamped to seq_len {})", spec.seq_len);
    let budget = config.parse_budget()?;
    let resident = model_bytes.len() + tokenizer_bytes.len();
    println!(
        "   Resident:    {:.2} MB of {} MB budget{}",
        resident as f64 / (1024.0 * 1024.0),
        budget.as_mb(),
        if resident > budget.as_bytes() { "  (OVER BUDGET)" } else { "" },
    );
    println!();

    Ok(())
}
