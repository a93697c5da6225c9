// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Capability-tagged memory pools with budget enforcement.
//!
//! A [`MemoryPool`] models one class of device memory (fast internal SRAM
//! or slower external PSRAM). It enforces a hard ceiling and hands out
//! [`ScratchArena`](crate::ScratchArena)s; the arena returns its bytes to the pool on drop.
//!
//! # Thread Safety
//! `MemoryPool` is `Send + Sync`. The benchmark task runs on its own
//! thread while the caller keeps a handle for diagnostics.

use crate::{AllocationStats, MemoryBudget, MemoryError};
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tensor_core::AlignedBuf;

/// The memory class a pool draws from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemoryRegion {
    /// On-chip RAM.
    Internal,
    /// External pseudo-static RAM. Larger and slower.
    External,
}

impl fmt::Display for MemoryRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Internal => f.write_str("internal"),
            Self::External => f.write_str("external"),
        }
    }
}

/// State shared between a pool and its outstanding arenas.
pub(crate) struct PoolInner {
    region: MemoryRegion,
    budget: MemoryBudget,
    allocated_bytes: AtomicUsize,
    stats: Mutex<AllocationStats>,
}

impl PoolInner {
    /// Called by `ScratchArena::drop` to give bytes back.
    pub(crate) fn release(&self, size_bytes: usize) {
        self.allocated_bytes.fetch_sub(size_bytes, Ordering::AcqRel);
        if let Ok(mut stats) = self.stats.lock() {
            stats.record_release();
        }
        tracing::trace!(region = %self.region, size_bytes, "scratch arena released");
    }

    pub(crate) fn region(&self) -> MemoryRegion {
        self.region
    }

    fn record_oom(&self) {
        if let Ok(mut stats) = self.stats.lock() {
            stats.record_oom();
        }
    }

    fn out_of_memory(&self, requested_bytes: usize, current: usize) -> MemoryError {
        self.record_oom();
        let budget = self.budget.as_bytes();
        tracing::warn!(
            region = %self.region,
            requested_bytes,
            available_bytes = budget.saturating_sub(current),
            "scratch arena request refused"
        );
        MemoryError::OutOfMemory {
            region: self.region,
            requested_bytes,
            available_bytes: budget.saturating_sub(current),
            budget_bytes: budget,
        }
    }
}

/// A budgeted source of scratch memory.
///
/// # Example
/// ```
/// use memory_manager::{MemoryBudget, MemoryPool, ScratchArena};
///
/// let pool = MemoryPool::external(MemoryBudget::from_kb(1024));
/// let arena = ScratchArena::acquire(&pool, MemoryBudget::from_kb(700)).unwrap();
/// assert_eq!(pool.allocated_bytes(), 700 * 1024);
///
/// drop(arena);
/// assert_eq!(pool.allocated_bytes(), 0);
/// ```
pub struct MemoryPool {
    inner: Arc<PoolInner>,
}

impl MemoryPool {
    /// Creates a pool over `region` with a hard ceiling of `budget`.
    pub fn new(region: MemoryRegion, budget: MemoryBudget) -> Self {
        Self {
            inner: Arc::new(PoolInner {
                region,
                budget,
                allocated_bytes: AtomicUsize::new(0),
                stats: Mutex::new(AllocationStats::default()),
            }),
        }
    }

    /// Shorthand for an external-RAM pool.
    pub fn external(budget: MemoryBudget) -> Self {
        Self::new(MemoryRegion::External, budget)
    }

    /// Reserves `size_bytes` against the budget and allocates zeroed,
    /// 8-byte aligned storage for it.
    pub(crate) fn reserve(
        &self,
        size_bytes: usize,
    ) -> Result<(AlignedBuf, Arc<PoolInner>), MemoryError> {
        if size_bytes == 0 {
            return Err(MemoryError::ZeroSizedAllocation);
        }

        let budget = self.inner.budget.as_bytes();
        let reserved = self.inner.allocated_bytes.fetch_update(
            Ordering::AcqRel,
            Ordering::Acquire,
            |current| {
                current
                    .checked_add(size_bytes)
                    .filter(|&next| next <= budget)
            },
        );
        let previous = match reserved {
            Ok(previous) => previous,
            Err(current) => return Err(self.inner.out_of_memory(size_bytes, current)),
        };

        // The budget admitted the request but the host may still refuse it.
        let Some(buf) = AlignedBuf::try_zeroed(size_bytes) else {
            self.inner
                .allocated_bytes
                .fetch_sub(size_bytes, Ordering::AcqRel);
            return Err(self.inner.out_of_memory(size_bytes, previous));
        };

        if let Ok(mut stats) = self.inner.stats.lock() {
            stats.record_acquire(size_bytes);
            stats.update_peak(previous + size_bytes);
        }
        tracing::debug!(region = %self.inner.region, size_bytes, "scratch arena acquired");

        Ok((buf, Arc::clone(&self.inner)))
    }

    /// Returns the memory class this pool models.
    pub fn region(&self) -> MemoryRegion {
        self.inner.region
    }

    /// Returns bytes currently held by live arenas.
    pub fn allocated_bytes(&self) -> usize {
        self.inner.allocated_bytes.load(Ordering::Acquire)
    }

    /// Returns bytes still available under the budget.
    pub fn available_bytes(&self) -> usize {
        self.inner
            .budget
            .as_bytes()
            .saturating_sub(self.allocated_bytes())
    }

    /// Returns the pool's ceiling.
    pub fn budget(&self) -> MemoryBudget {
        self.inner.budget
    }

    /// Returns a snapshot of the pool's statistics.
    pub fn stats(&self) -> AllocationStats {
        self.inner
            .stats
            .lock()
            .map(|s| s.clone())
            .unwrap_or_default()
    }
}

impl fmt::Debug for PoolInner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryPool")
            .field("region", &self.region)
            .field("budget", &self.budget)
            .field("allocated_bytes", &self.allocated_bytes.load(Ordering::Acquire))
            .finish()
    }
}

impl fmt::Debug for MemoryPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.inner, f)
    }
}
