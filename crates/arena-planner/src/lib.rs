// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # arena-planner
//!
//! Lays the tensors of an inference session out inside one fixed-size
//! scratch arena, using pluggable planners.
//!
//! # Planners
//!
//! | Planner | Reuse | Arena needed |
//! |---|---|---|
//! | [`LinearPlanner`] | none | sum of all tensors |
//! | [`GreedyPlanner`] | lifetime-aware | largest live working set (approx.) |
//!
//! Every offset is a multiple of [`ARENA_ALIGNMENT`], so any tensor can be
//! viewed as `f32` without an alignment fault.
//!
//! # Trait-Based Extensibility
//!
//! ```ignore
//! struct FirstFit;
//! impl MemoryPlanner for FirstFit {
//!     fn name(&self) -> &str { "first-fit" }
//!     fn plan(&self, requests: &[TensorRequest], capacity: usize)
//!         -> Result<ArenaLayout, PlannerError> { /* ... */ }
//! }
//! ```
//!
//! # Example
//! ```
//! use arena_planner::{GreedyPlanner, MemoryPlanner, TensorRequest};
//!
//! let requests = [
//!     TensorRequest::new(480, 0, 0),
//!     TensorRequest::new(3840, 0, 1),
//!     TensorRequest::new(1920, 1, 2),
//! ];
//! let layout = GreedyPlanner::new().plan(&requests, 700 * 1024).unwrap();
//! assert!(layout.total_bytes <= 700 * 1024);
//! ```

mod error;
pub(crate) mod layout;
pub mod strategy;

pub use error::PlannerError;
pub use layout::{ArenaLayout, TensorRequest};
pub use strategy::greedy::GreedyPlanner;
pub use strategy::linear::LinearPlanner;
pub use strategy::MemoryPlanner;

/// Alignment of every tensor offset inside the arena.
pub const ARENA_ALIGNMENT: usize = 16;

/// Rounds `n` up to the next multiple of [`ARENA_ALIGNMENT`].
pub const fn align_up(n: usize) -> usize {
    n.div_ceil(ARENA_ALIGNMENT) * ARENA_ALIGNMENT
}

/// Names accepted by [`planner_by_name`].
pub const PLANNER_NAMES: [&str; 2] = ["greedy", "linear"];

/// Looks a planner up by its configuration name.
pub fn planner_by_name(name: &str) -> Option<Box<dyn MemoryPlanner>> {
    match name.trim().to_ascii_lowercase().as_str() {
        "greedy" => Some(Box::new(GreedyPlanner::new())),
        "linear" => Some(Box::new(LinearPlanner::new())),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_align_up() {
        assert_eq!(align_up(0), 0);
        assert_eq!(align_up(1), 16);
        assert_eq!(align_up(16), 16);
        assert_eq!(align_up(17), 32);
    }

    #[test]
    fn test_planner_by_name() {
        assert_eq!(planner_by_name("greedy").unwrap().name(), "greedy");
        assert_eq!(planner_by_name(" Linear ").unwrap().name(), "linear");
        assert!(planner_by_name("speculative").is_none());
    }
}
