// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for memory management.

use crate::MemoryRegion;

/// Errors that can occur while acquiring scratch memory.
#[derive(Debug, thiserror::Error)]
pub enum MemoryError {
    /// The pool cannot satisfy the request.
    #[error("out of {region} memory: requested {requested_bytes} bytes, but only {available_bytes} available (budget: {budget_bytes})")]
    OutOfMemory {
        region: MemoryRegion,
        requested_bytes: usize,
        available_bytes: usize,
        budget_bytes: usize,
    },

    /// Attempted to acquire a zero-sized region.
    #[error("cannot allocate zero-sized buffer")]
    ZeroSizedAllocation,

    /// A size string could not be parsed.
    #[error("invalid size '{input}': expected a number followed by an optional suffix (K, M, G)")]
    InvalidSize { input: String },
}
