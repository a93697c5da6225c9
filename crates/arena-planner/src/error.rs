// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for the arena planner.

/// Errors that can occur while laying tensors out in an arena.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlannerError {
    /// The planned working set does not fit the arena.
    #[error("arena too small: plan requires {required} bytes, arena is {available}")]
    ArenaTooSmall { required: usize, available: usize },

    /// Nothing to plan.
    #[error("no tensors to plan")]
    Empty,

    /// A request is malformed (zero size or inverted lifetime).
    #[error("invalid tensor request #{index}: {detail}")]
    InvalidRequest { index: usize, detail: String },

    /// A layout broke its own invariants.
    #[error("planner '{planner}' produced an invalid layout: {detail}")]
    InvalidLayout { planner: String, detail: String },
}
