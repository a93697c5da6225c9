// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Arena layout: the output of a planner.
//!
//! A layout assigns every tensor an offset inside the scratch arena. Two
//! tensors may share bytes only if their lifetimes are disjoint. The layout
//! is the contract between the planner and the inference session.

use crate::{align_up, PlannerError, ARENA_ALIGNMENT};

/// One tensor the session needs to place.
///
/// Lifetimes are inclusive node indices: a tensor produced by node `i` and
/// last read by node `j` has `first_use = i`, `last_use = j`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct TensorRequest {
    pub size_bytes: usize,
    pub first_use: usize,
    pub last_use: usize,
}

impl TensorRequest {
    pub fn new(size_bytes: usize, first_use: usize, last_use: usize) -> Self {
        Self {
            size_bytes,
            first_use,
            last_use,
        }
    }

    /// Returns `true` if both tensors are live at some common node.
    pub fn overlaps(&self, other: &TensorRequest) -> bool {
        self.first_use <= other.last_use && other.first_use <= self.last_use
    }

    pub(crate) fn check(&self, index: usize) -> Result<(), PlannerError> {
        if self.size_bytes == 0 {
            return Err(PlannerError::InvalidRequest {
                index,
                detail: "zero-sized tensor".into(),
            });
        }
        if self.first_use > self.last_use {
            return Err(PlannerError::InvalidRequest {
                index,
                detail: format!(
                    "lifetime starts at node {} after it ends at node {}",
                    self.first_use, self.last_use
                ),
            });
        }
        Ok(())
    }
}

/// Offsets assigned by a [`crate::MemoryPlanner`].
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ArenaLayout {
    /// Planner that produced this layout.
    pub planner_name: String,
    /// Byte offset of each request, in request order.
    pub offsets: Vec<usize>,
    /// High-water mark: bytes from the arena start to the end of the
    /// furthest tensor.
    pub total_bytes: usize,
    /// Arena size the layout was planned against.
    pub capacity_bytes: usize,
}

impl ArenaLayout {
    /// Returns the offset of tensor `index`.
    pub fn offset(&self, index: usize) -> Option<usize> {
        self.offsets.get(index).copied()
    }

    /// Returns the number of placed tensors.
    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    /// Returns `true` if the layout places nothing.
    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    /// Checks the layout against the requests it was built from.
    ///
    /// - one offset per request, each [`ARENA_ALIGNMENT`]-aligned;
    /// - tensors with overlapping lifetimes never share bytes;
    /// - every tensor ends within `total_bytes`, which fits the capacity.
    pub fn validate(&self, requests: &[TensorRequest]) -> Result<(), PlannerError> {
        let fail = |detail: String| PlannerError::InvalidLayout {
            planner: self.planner_name.clone(),
            detail,
        };

        if self.offsets.len() != requests.len() {
            return Err(fail(format!(
                "{} offsets for {} requests",
                self.offsets.len(),
                requests.len()
            )));
        }

        for (i, (&off, req)) in self.offsets.iter().zip(requests).enumerate() {
            if off % ARENA_ALIGNMENT != 0 {
                return Err(fail(format!("tensor {i} at unaligned offset {off}")));
            }
            if off + req.size_bytes > self.total_bytes {
                return Err(fail(format!(
                    "tensor {i} ends at {} past the high-water mark {}",
                    off + req.size_bytes,
                    self.total_bytes
                )));
            }
            for (j, (&other_off, other)) in self.offsets.iter().zip(requests).enumerate().skip(i + 1) {
                let disjoint_bytes =
                    off + req.size_bytes <= other_off || other_off + other.size_bytes <= off;
                if req.overlaps(other) && !disjoint_bytes {
                    return Err(fail(format!("live tensors {i} and {j} share bytes")));
                }
            }
        }

        if self.total_bytes > self.capacity_bytes {
            return Err(PlannerError::ArenaTooSmall {
                required: self.total_bytes,
                available: self.capacity_bytes,
            });
        }
        Ok(())
    }

    /// Returns a one-line summary for logs.
    pub fn summary(&self) -> String {
        let pct = if self.capacity_bytes == 0 {
            0.0
        } else {
            self.total_bytes as f64 / self.capacity_bytes as f64 * 100.0
        };
        format!(
            "Layout '{}': {} tensors, {} of {} bytes ({:.1}% of arena)",
            self.planner_name,
            self.len(),
            self.total_bytes,
            self.capacity_bytes,
            pct,
        )
    }
}

/// Computes the high-water mark of a set of placements.
pub(crate) fn high_water_mark(offsets: &[usize], requests: &[TensorRequest]) -> usize {
    offsets
        .iter()
        .zip(requests)
        .map(|(&off, req)| align_up(off + req.size_bytes))
        .max()
        .unwrap_or(0)
}
