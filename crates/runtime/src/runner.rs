// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Single-shot benchmark orchestration.
//!
//! One call to [`BenchmarkRunner::run`] walks the pipeline below. Any
//! failure ends in `Failed(kind)`; the arena is released on every path
//! and the watchdog is re-enabled on every path that disabled it.
//!
//! ```text
//! Init -> ModelValidated -> ArenaAcquired -> SessionBuilt -> TensorsAllocated
//!      -> InputBound -> WatchdogDisabled -> Invoked -> WatchdogRestored
//!      -> ArenaReleased -> Reported -> Done
//! ```

use crate::report::{BenchmarkReport, InferenceResult};
use crate::{
    bind_input_f32, reduce_scores, task, BenchmarkConfig, ErrorKind, InferenceSession, RuntimeError,
};
use memory_manager::{MemoryPool, ScratchArena};
use model_ir::{ModelDescriptor, OperatorRegistry};
use std::time::Instant;
use task_watchdog::{Watchdog, WatchdogGuard};

/// Pipeline stage reached by a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunnerState {
    Init,
    ModelValidated,
    ArenaAcquired,
    SessionBuilt,
    TensorsAllocated,
    InputBound,
    WatchdogDisabled,
    Invoked,
    WatchdogRestored,
    ArenaReleased,
    Reported,
    Done,
    Failed(ErrorKind),
}

impl RunnerState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed(_))
    }
}

#[derive(Debug, Default)]
struct StateLog(Vec<RunnerState>);

impl StateLog {
    fn enter(&mut self, state: RunnerState) {
        tracing::debug!(?state, "benchmark stage");
        self.0.push(state);
    }
}

/// Runs the benchmark pipeline against an injected watchdog.
pub struct BenchmarkRunner<'w, W: Watchdog + ?Sized> {
    config: BenchmarkConfig,
    watchdog: &'w mut W,
    log: StateLog,
}

impl<'w, W: Watchdog + ?Sized> BenchmarkRunner<'w, W> {
    pub fn new(config: BenchmarkConfig, watchdog: &'w mut W) -> Self {
        Self {
            config,
            watchdog,
            log: StateLog(vec![RunnerState::Init]),
        }
    }

    pub fn config(&self) -> &BenchmarkConfig {
        &self.config
    }

    /// Every stage entered so far, starting with `Init`.
    pub fn history(&self) -> &[RunnerState] {
        &self.log.0
    }

    /// The most recent stage.
    pub fn state(&self) -> RunnerState {
        self.log.0.last().copied().unwrap_or(RunnerState::Init)
    }

    /// Runs one benchmark over `blob` with `sample` as the input window.
    ///
    /// The arena comes from `pool` and is back in it when this returns.
    pub fn run<const N: usize>(
        &mut self,
        blob: &[u8],
        pool: &MemoryPool,
        registry: &OperatorRegistry<N>,
        sample: &[f32],
    ) -> Result<BenchmarkReport, RuntimeError> {
        if self.state() != RunnerState::Init {
            self.log = StateLog(vec![RunnerState::Init]);
        }

        match self.execute(blob, pool, registry, sample) {
            Ok(report) => {
                self.log.enter(RunnerState::Reported);
                self.log.enter(RunnerState::Done);
                Ok(report)
            }
            Err(e) => {
                tracing::error!(kind = %e.kind(), "benchmark failed: {e}");
                self.log.enter(RunnerState::Failed(e.kind()));
                Err(e)
            }
        }
    }

    fn execute<const N: usize>(
        &mut self,
        blob: &[u8],
        pool: &MemoryPool,
        registry: &OperatorRegistry<N>,
        sample: &[f32],
    ) -> Result<BenchmarkReport, RuntimeError> {
        self.config.validate()?;
        let arena_size = self.config.parse_arena_size()?;
        let planner = self.config.create_planner()?;
        let class_count = self.config.class_count;
        let iterations = self.config.iterations.max(1);

        let model = ModelDescriptor::load(blob)?;
        self.log.enter(RunnerState::ModelValidated);

        let mut arena = ScratchArena::acquire(pool, arena_size)?;
        self.log.enter(RunnerState::ArenaAcquired);
        tracing::info!("{arena:?}");

        let mut session = InferenceSession::build(&model, registry, &mut arena, planner)?;
        self.log.enter(RunnerState::SessionBuilt);

        session.allocate_tensors()?;
        self.log.enter(RunnerState::TensorsAllocated);

        let outputs = session.output(0)?.shape().num_elements();
        if outputs < class_count {
            return Err(RuntimeError::OutputMismatch {
                expected: class_count,
                actual: outputs,
            });
        }

        bind_input_f32(&mut session.input(0)?, sample)?;
        self.log.enter(RunnerState::InputBound);

        let guard = WatchdogGuard::disable(&mut *self.watchdog, self.config.watchdog)?;
        self.log.enter(RunnerState::WatchdogDisabled);

        let mut durations = Vec::with_capacity(iterations);
        for _ in 0..iterations {
            let start = Instant::now();
            let outcome = session.invoke();
            let elapsed = elapsed_micros(start);
            if let Err(e) = outcome {
                if let Err(restore) = guard.restore() {
                    tracing::error!(error = %restore, "watchdog restore failed after invoke error");
                } else {
                    self.log.enter(RunnerState::WatchdogRestored);
                }
                drop(session);
                arena.release();
                self.log.enter(RunnerState::ArenaReleased);
                return Err(e);
            }
            durations.push(elapsed);
        }
        self.log.enter(RunnerState::Invoked);

        guard.restore()?;
        self.log.enter(RunnerState::WatchdogRestored);

        let scores = session.output(0)?.f32_data("output")?[..class_count].to_vec();
        let arena_used_bytes = session.arena_used_bytes().unwrap_or(0);
        let arena_size_bytes = arena_size.as_bytes();
        drop(session);
        arena.release();
        self.log.enter(RunnerState::ArenaReleased);

        let prediction = reduce_scores(&scores, class_count).ok_or(RuntimeError::NoPrediction)?;
        let elapsed_us = durations.first().copied().unwrap_or(0);
        tracing::info!(
            class = prediction.class,
            confidence = prediction.confidence,
            elapsed_us,
            "inference complete"
        );

        Ok(BenchmarkReport {
            platform: self.config.platform.clone(),
            core: task::current_core().unwrap_or(self.config.task.core),
            arena_size_bytes,
            result: InferenceResult {
                predicted_class: prediction.class,
                confidence: prediction.confidence,
                elapsed_us,
                arena_used_bytes,
                pass_durations_us: durations,
            },
        })
    }
}

/// Microseconds since `start`, saturating at `u64::MAX`.
fn elapsed_micros(start: Instant) -> u64 {
    u64::try_from(start.elapsed().as_micros()).unwrap_or(u64::MAX)
}

impl<W: Watchdog + ?Sized> std::fmt::Debug for BenchmarkRunner<'_, W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BenchmarkRunner")
            .field("platform", &self.config.platform)
            .field("state", &self.state())
            .field("watchdog_enabled", &self.watchdog.is_enabled())
            .finish()
    }
}
