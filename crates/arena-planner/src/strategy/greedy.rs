// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Greedy-by-size planner.
//!
//! Places the largest tensors first, each at the lowest aligned offset that
//! does not collide with an already placed tensor whose lifetime overlaps.
//! Tensors that are never live together end up sharing bytes, so the arena
//! only needs to hold the largest simultaneously-live working set (plus
//! fragmentation).
//!
//! # Memory Model
//!
//! ```text
//! offset ─►  0          480                 4320
//!            ├─ input ──┤                    │      node 0 (conv)
//!            ├──────────┴──── conv out ──────┤      node 0..1
//!            ├─ pool out ┤                          node 1..2  (reuses input bytes)
//! ```
//!
//! # When to use
//! - Default planner: same results as linear, much smaller arena.

use crate::layout::high_water_mark;
use crate::strategy::{check_requests, MemoryPlanner};
use crate::{align_up, ArenaLayout, PlannerError, TensorRequest};

/// Largest-first placement with lifetime-aware reuse.
#[derive(Debug, Clone, Default)]
pub struct GreedyPlanner;

impl GreedyPlanner {
    pub fn new() -> Self {
        Self
    }
}

impl MemoryPlanner for GreedyPlanner {
    fn name(&self) -> &str {
        "greedy"
    }

    fn plan(
        &self,
        requests: &[TensorRequest],
        capacity: usize,
    ) -> Result<ArenaLayout, PlannerError> {
        check_requests(requests)?;

        // Largest first; ties keep request order so layouts are deterministic.
        let mut order: Vec<usize> = (0..requests.len()).collect();
        order.sort_by(|&a, &b| {
            requests[b]
                .size_bytes
                .cmp(&requests[a].size_bytes)
                .then(a.cmp(&b))
        });

        let mut offsets: Vec<Option<usize>> = vec![None; requests.len()];
        for &idx in &order {
            let offset = lowest_fit(idx, requests, &offsets);
            offsets[idx] = Some(offset);
        }

        let offsets: Vec<usize> = offsets.into_iter().map(|o| o.unwrap_or(0)).collect();
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
        tracing::trace!("{}", layout.summary());
        Ok(layout)
    }
}

/// Finds the lowest aligned offset where `requests[idx]` fits between the
/// already placed tensors it is live alongside.
fn lowest_fit(idx: usize, requests: &[TensorRequest], placed: &[Option<usize>]) -> usize {
    let req = &requests[idx];

    let mut conflicts: Vec<(usize, usize)> = placed
        .iter()
        .zip(requests)
        .filter_map(|(off, other)| off.map(|o| (o, other)))
        .filter(|(_, other)| req.overlaps(other))
        .map(|(o, other)| (o, o + other.size_bytes))
        .collect();
    conflicts.sort_unstable();

    let mut candidate = 0usize;
    for (start, end) in conflicts {
        if candidate + req.size_bytes <= start {
            break;
        }
        candidate = candidate.max(align_up(end));
    }
    candidate
}
