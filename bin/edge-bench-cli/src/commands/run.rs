// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `edge-bench run`: one timed inference on a dedicated task.
//!
//! ```text
//! main ── start watchdog + idle feeder ── spawn BenchmarkTask (core N)
//!                                              │ claim core, BenchmarkRunner::run
//! blocking worker ── join ◄────────────────────┘
//! ```

use super::{load_config, read_f32_file, ModelSource};
use anyhow::Context;
use clap::Args;
use memory_manager::MemoryPool;
use model_ir::register_supported_ops;
use runtime::{spawn_pinned, BenchmarkConfig, BenchmarkReport, BenchmarkRunner, RuntimeError, TaskSpec};
use std::path::PathBuf;
use task_watchdog::{IdleFeeder, TaskWatchdog};

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Model file. Defaults to the built-in model.
    #[arg(short, long)]
    pub model: Option<PathBuf>,

    /// Raw little-endian f32 input. Defaults to the built-in test window.
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Scratch arena size (e.g. "700K").
    #[arg(short, long)]
    pub arena_size: Option<String>,

    /// Arena planner: greedy or linear.
    #[arg(short, long)]
    pub planner: Option<String>,

    /// Core the benchmark task is pinned to.
    #[arg(long)]
    pub core: Option<usize>,

    /// Timed passes inside the watchdog window.
    #[arg(short = 'n', long)]
    pub iterations: Option<usize>,

    /// Print the report as JSON instead of text.
    #[arg(long)]
    pub json: bool,
}

impl RunArgs {
    fn apply(&self, config: &mut BenchmarkConfig) {
        if let Some(size) = &self.arena_size {
            config.arena_size = size.clone();
        }
        if let Some(planner) = &self.planner {
            config.planner = planner.clone();
        }
        if let Some(core) = self.core {
            config.task.core = core;
        }
        if let Some(n) = self.iterations {
            config.iterations = n;
        }
    }
}

pub async fn execute(config_path: Option<PathBuf>, args: RunArgs) -> anyhow::Result<()> {
    let mut config = load_config(config_path.as_deref())?;
    args.apply(&mut config);
    config.validate()?;

    let model = ModelSource::open(args.model.clone())?;
    let sample = match &args.input {
        Some(path) => read_f32_file(path)?,
        None => runtime::demo::test_vector(),
    };
    tracing::info!(
        model = %model.label(),
        inputs = sample.len(),
        "benchmark configured: arena {}, planner {}, {}",
        config.arena_size,
        config.planner,
        config.watchdog
    );

    let pool = MemoryPool::external(config.parse_external_pool_size()?);
    let watchdog = TaskWatchdog::start(&config.watchdog).context("failed to start task watchdog")?;
    let feeder = IdleFeeder::start(
        watchdog.feed_handle(),
        config.watchdog.monitored_cores,
        config.watchdog.timeout() / 4,
    )?;

    let core = config.task.core;
    let claim = if config.watchdog.monitored_cores.contains(core) {
        Some(feeder.claim(core)?)
    } else {
        tracing::warn!("core {core} is not monitored by the task watchdog");
        None
    };

    let spec = TaskSpec::from(&config.task);
    let handle = spawn_pinned(&spec, move || -> Result<BenchmarkReport, RuntimeError> {
        let _claim = claim;
        let mut watchdog = watchdog;
        let registry = register_supported_ops()?;
        let mut runner = BenchmarkRunner::new(config, &mut watchdog);
        runner.run(model.as_bytes(), &pool, &registry, &sample)
    })?;

    let outcome = tokio::task::spawn_blocking(move || handle.join())
        .await
        .context("benchmark join worker failed")??;
    feeder.stop();

    let report = outcome?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("\n\n{report}\n");
    }
    Ok(())
}
