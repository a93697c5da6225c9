// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Linear (bump) planner.
//!
//! Every tensor gets its own bytes, one after another, regardless of
//! lifetime. The arena must hold the sum of all tensors.
//!
//! # When to use
//! - Debugging: no two tensors ever alias, so a stale read shows up as
//!   wrong values rather than corrupted neighbours.
//! - Baseline for measuring what the greedy planner saves.

use crate::layout::high_water_mark;
use crate::strategy::{check_requests, MemoryPlanner};
use crate::{align_up, ArenaLayout, PlannerError, TensorRequest};

/// One slot per tensor, no reuse.
#[derive(Debug, Clone, Default)]
pub struct LinearPlanner;

impl LinearPlanner {
    pub fn new() -> Self {
        Self
    }
}

impl MemoryPlanner for LinearPlanner {
    fn name(&self) -> &str {
        "linear"
    }

    fn plan(
        &self,
        requests: &[TensorRequest],
        capacity: usize,
    ) -> Result<ArenaLayout, PlannerError> {
        check_requests(requests)?;

        let mut cursor = 0usize;
        let mut offsets = Vec::with_capacity(requests.len());
        for req in requests {
            offsets.push(cursor);
            cursor = align_up(cursor + req.size_bytes);
        }

        let total = high_water_mark(&offsets, requests);
        if total > capacity {
            return Err(PlannerError::ArenaTooSmall {
                required: total,
                available: capacity,
            });
        }

        let layout = ArenaLayout {
            planner_name: self.name().to_string(),
            offsets,
            total_bytes: total,
            capacity_bytes: capacity,
        };
        layout.validate(requests)?;
        Ok(layout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_packs_in_order() {
        let reqs = [
            TensorRequest::new(480, 0, 0),
            TensorRequest::new(3840, 0, 1),
            TensorRequest::new(20, 1, 2),
        ];
        let layout = LinearPlanner::new().plan(&reqs, 8192).unwrap();
        assert_eq!(layout.offsets, vec![0, 480, 4320]);
        assert_eq!(layout.total_bytes, 4352);
    }

    #[test]
    fn test_linear_aligns_offsets() {
        let reqs = [TensorRequest::new(5, 0, 0), TensorRequest::new(5, 1, 1)];
        let layout = LinearPlanner::new().plan(&reqs, 64).unwrap();
        assert_eq!(layout.offsets, vec![0, 16]);
        assert_eq!(layout.total_bytes, 32);
    }

    #[test]
    fn test_linear_too_small() {
        let reqs = [TensorRequest::new(64, 0, 0), TensorRequest::new(64, 1, 1)];
        assert_eq!(
            LinearPlanner::new().plan(&reqs, 100),
            Err(PlannerError::ArenaTooSmall {
                required: 128,
                available: 100
            })
        );
    }

    #[test]
    fn test_linear_empty() {
        assert_eq!(LinearPlanner::new().plan(&[], 64), Err(PlannerError::Empty));
    }
}
