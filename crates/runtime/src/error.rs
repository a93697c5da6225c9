// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for the benchmark runtime.

use model_ir::{ModelError, OpKind, RegistryError};
use std::fmt;

/// Errors that can end a benchmark run. Every one is terminal.
#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    /// Loading or validating the model failed.
    #[error("model error: {0}")]
    Model(#[from] ModelError),

    /// The operator registry could not be populated.
    #[error("operator registry error: {0}")]
    Registry(#[from] RegistryError),

    /// The graph uses an operator the registry does not carry.
    #[error("node '{node}' uses unsupported operator {op}")]
    UnsupportedOp { node: String, op: OpKind },

    /// The scratch arena could not be acquired.
    #[error("memory error: {0}")]
    Memory(#[from] memory_manager::MemoryError),

    /// The session's tensors do not fit the arena.
    #[error("tensor allocation failed: {0}")]
    TensorAllocation(#[from] arena_planner::PlannerError),

    /// A tensor view over the arena could not be formed.
    #[error("tensor view error: {0}")]
    View(#[from] tensor_core::TensorError),

    /// Input data does not match the input tensor's byte length.
    #[error("input size mismatch: tensor holds {expected} bytes, data has {actual}")]
    SizeMismatch { expected: usize, actual: usize },

    /// A kernel failed during the forward pass.
    #[error("invoke failed at node '{node}': {source}")]
    Invoke {
        node: String,
        #[source]
        source: tensor_core::TensorError,
    },

    /// Disabling or restoring the task watchdog failed.
    #[error("watchdog error: {0}")]
    Watchdog(#[from] task_watchdog::WatchdogError),

    /// Only tensor index 0 exists on either side of the session.
    #[error("tensor index {index} out of range (session has {count})")]
    TensorIndex { index: usize, count: usize },

    /// Tensor access before `allocate_tensors`.
    #[error("tensors have not been allocated")]
    TensorsNotAllocated,

    /// The output tensor cannot hold the configured number of classes.
    #[error("output has {actual} elements, expected at least {expected} class scores")]
    OutputMismatch { expected: usize, actual: usize },

    /// The output holds no usable score (every scanned value is NaN).
    #[error("output holds no finite class score")]
    NoPrediction,

    /// The benchmark task could not be spawned or did not finish cleanly.
    #[error("benchmark task error: {0}")]
    Task(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Coarse classification of a [`RuntimeError`], recorded in the runner's
/// `Failed` state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
pub enum ErrorKind {
    SchemaMismatch,
    OutOfMemory,
    Build,
    TensorAllocation,
    SizeMismatch,
    Invoke,
    Watchdog,
    Output,
    Task,
    Config,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl RuntimeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Model(ModelError::SchemaMismatch { .. }) => ErrorKind::SchemaMismatch,
            Self::Model(_) | Self::Registry(_) | Self::UnsupportedOp { .. } => ErrorKind::Build,
            Self::Memory(_) => ErrorKind::OutOfMemory,
            Self::TensorAllocation(_) | Self::View(_) => ErrorKind::TensorAllocation,
            Self::SizeMismatch { .. } => ErrorKind::SizeMismatch,
            Self::Invoke { .. } => ErrorKind::Invoke,
            Self::Watchdog(_) => ErrorKind::Watchdog,
            Self::TensorIndex { .. }
            | Self::TensorsNotAllocated
            | Self::OutputMismatch { .. }
            | Self::NoPrediction => ErrorKind::Output,
            Self::Task(_) => ErrorKind::Task,
            Self::Config(_) => ErrorKind::Config,
        }
    }
}
