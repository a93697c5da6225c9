// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # memory-manager
//!
//! Budgeted scratch memory for the benchmark harness.
//!
//! # Key Components
//!
//! - [`MemoryBudget`]: a byte count with human-readable parsing (`"700K"`).
//! - [`MemoryPool`]: a capability-tagged source of memory
//!   ([`MemoryRegion::External`] for the PSRAM-backed arena) with a hard
//!   ceiling and statistics.
//! - [`ScratchArena`]: the RAII region an inference session plans its
//!   tensors into. Dropping it returns the bytes to the pool.
//! - [`AllocationStats`]: acquire/release/refusal counters.
//!
//! # Ownership Model
//!
//! ```text
//! ScratchArena::acquire(&pool, size)
//!       │
//!       ▼
//!   ScratchArena  ◄─── owns AlignedBuf, holds Arc<PoolInner>
//!       │
//!       │  drop() / release()
//!       ▼
//!   PoolInner::release()  ──► allocated_bytes -= size
//! ```

mod arena;
mod budget;
mod error;
pub mod pool;
mod stats;

pub use arena::ScratchArena;
pub use budget::MemoryBudget;
pub use error::MemoryError;
pub use pool::{MemoryPool, MemoryRegion};
pub use stats::AllocationStats;
