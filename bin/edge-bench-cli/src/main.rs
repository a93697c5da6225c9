// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # edge-bench
//!
//! Command-line interface for the single-shot inference benchmark.
//!
//! ## Usage
//! ```bash
//! # Time one inference of the built-in model on its test window
//! edge-bench run
//!
//! # Time a model file against a raw little-endian f32 input
//! edge-bench run --model har-cnn.safetensors --input window.f32 --iterations 10
//!
//! # Inspect model structure and arena requirements
//! edge-bench inspect --model har-cnn.safetensors
//!
//! # Write the built-in model, test window and default config to disk
//! edge-bench export-demo --out-dir ./demo
//! ```

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "edge-bench",
    about = "Single-shot inference benchmark for a small CNN in a fixed arena",
    version,
    author
)]
struct Cli {
    /// Path to a TOML configuration file. Command-line flags override it.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging (repeat for more: -v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the benchmark once and print the report.
    Run(commands::run::RunArgs),

    /// Print the graph, weights and arena usage of a model.
    Inspect {
        /// Model file. Defaults to the built-in model.
        #[arg(short, long)]
        model: Option<PathBuf>,
    },

    /// Write the built-in model, its test window and a default config.
    ExportDemo {
        /// Output directory (created if missing).
        #[arg(short, long)]
        out_dir: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    commands::init_tracing(cli.verbose);

    match cli.command {
        Commands::Run(args) => commands::run::execute(cli.config, args).await,
        Commands::Inspect { model } => commands::inspect::execute(cli.config, model).await,
        Commands::ExportDemo { out_dir } => commands::export::execute(out_dir).await,
    }
}
