// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The [`MemoryPlanner`] trait and planner implementations.

pub mod greedy;
pub mod linear;

use crate::{ArenaLayout, PlannerError, TensorRequest};

/// Trait for arena planners.
///
/// A planner takes the tensors a session needs, with their lifetimes, and
/// the arena capacity, and returns an [`ArenaLayout`] that fits.
///
/// Planners are purely algorithmic (no I/O, no arena access), which keeps
/// them unit-testable and amenable to property-based testing.
pub trait MemoryPlanner: Send + Sync {
    /// Human-readable name of this planner.
    fn name(&self) -> &str;

    /// Places `requests` inside an arena of `capacity` bytes.
    fn plan(&self, requests: &[TensorRequest], capacity: usize)
        -> Result<ArenaLayout, PlannerError>;
}

/// Shared preamble: rejects empty or malformed request lists.
pub(crate) fn check_requests(requests: &[TensorRequest]) -> Result<(), PlannerError> {
    if requests.is_empty() {
        return Err(PlannerError::Empty);
    }
    requests
        .iter()
        .enumerate()
        .try_for_each(|(i, r)| r.check(i))
}
