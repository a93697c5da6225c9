// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # runtime
//!
//! Runs a single timed inference of a small CNN inside a fixed scratch
//! arena and reports the predicted class and the pure inference time.
//!
//! The runtime takes:
//! - A model blob, validated through `model-ir`.
//! - A [`memory_manager::MemoryPool`] the scratch arena is carved from.
//! - An [`arena_planner::MemoryPlanner`] that places activations in it.
//! - A [`task_watchdog::Watchdog`] that is paused around the timed pass.
//!
//! # Pipeline
//! ```text
//! BenchmarkRunner::run
//!   load + validate model ─► acquire arena ─► InferenceSession::build
//!   ─► allocate_tensors ─► bind input ─► [watchdog off] invoke [watchdog on]
//!   ─► copy scores ─► release arena ─► reduce_scores ─► BenchmarkReport
//! ```
//!
//! [`InferenceSession`] can also be driven directly when no watchdog or
//! report is wanted.

mod binding;
mod config;
pub mod demo;
mod error;
mod reduce;
mod report;
mod runner;
mod session;
pub mod task;

pub use binding::{bind_input, bind_input_f32};
pub use config::{
    BenchmarkConfig, TaskConfig, DEFAULT_ARENA_SIZE, DEFAULT_CLASS_COUNT,
    DEFAULT_EXTERNAL_POOL_SIZE, DEFAULT_PLANNER, DEFAULT_PLATFORM, TASK_CORE, TASK_NAME,
    TASK_PRIORITY, TASK_STACK_SIZE,
};
pub use error::{ErrorKind, RuntimeError};
pub use reduce::{reduce_scores, Prediction};
pub use report::{BenchmarkReport, InferenceResult};
pub use runner::{BenchmarkRunner, RunnerState};
pub use session::InferenceSession;
pub use task::{spawn_pinned, TaskHandle, TaskSpec};
