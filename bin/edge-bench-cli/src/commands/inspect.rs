// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `edge-bench inspect`: model structure and arena requirements.
//!
//! Validates the blob, prints the node chain with tensor shapes and
//! weights, then plans the activations with every planner to show how much
//! of the configured arena each one needs.

use super::{load_config, ModelSource};
use arena_planner::{planner_by_name, PLANNER_NAMES};
use memory_manager::{MemoryPool, ScratchArena};
use model_ir::{register_supported_ops, ModelDescriptor};
use runtime::InferenceSession;
use std::path::PathBuf;

pub async fn execute(config_path: Option<PathBuf>, model: Option<PathBuf>) -> anyhow::Result<()> {
    let config = load_config(config_path.as_deref())?;
    let source = ModelSource::open(model)?;
    let descriptor = ModelDescriptor::load(source.as_bytes())?;
    let graph = descriptor.graph()?;

    println!("  Source: {}", source.label());
    println!("  Blob:   {}", descriptor.summary());
    println!("  {}", graph.summary());
    println!();

    // ── Nodes ──────────────────────────────────────────────────
    println!("  {:<4} {:<16} {:<16} {:>18} {:>10}", "Idx", "Name", "Op", "Output", "Bytes");
    println!("  {}", "-".repeat(68));
    for (i, node) in graph.iter_nodes().enumerate() {
        let out = &graph.tensors()[i + 1];
        println!(
            "  {:<4} {:<16} {:<16} {:>18} {:>10}",
            i,
            truncate(&node.name, 16),
            node.op.kind().as_str(),
            out.shape.to_string(),
            out.size_bytes(),
        );
    }
    println!();

    // ── Weights ────────────────────────────────────────────────
    let mut weights: Vec<_> = descriptor.weight_metadata()?.into_values().collect();
    weights.sort_by(|a, b| a.name.cmp(&b.name));
    println!("  Weights:");
    for w in &weights {
        println!("   {:<16} {:>18} {:>10} B", truncate(&w.name, 16), w.shape.to_string(), w.size_bytes);
    }
    println!();

    // ── Arena usage per planner ────────────────────────────────
    let arena_size = config.parse_arena_size()?;
    let registry = register_supported_ops()?;
    let pool = MemoryPool::external(config.parse_external_pool_size()?);
    println!("  Arena usage ({arena_size} arena):");
    for name in PLANNER_NAMES {
        let Some(planner) = planner_by_name(name) else {
            continue;
        };
        let mut arena = ScratchArena::acquire(&pool, arena_size)?;
        let mut session = InferenceSession::build(&descriptor, &registry, &mut arena, planner)?;
        match session.allocate_tensors() {
            Ok(()) => {
                let used = session.arena_used_bytes().unwrap_or(0);
                println!(
                    "   {:<8} {:>10} B  ({:.1}% of arena)",
                    name,
                    used,
                    used as f64 * 100.0 / arena_size.as_bytes() as f64
                );
            }
            Err(e) => println!("   {name:<8} FAILED: {e}"),
        }
    }
    println!();
    Ok(())
}

/// Truncates a string to `max_len` with ellipsis if needed.
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len - 3).collect();
        format!("{head}...")
    }
}
