// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! RAII scratch arena.
//!
//! A [`ScratchArena`] is the single contiguous region an inference session
//! places every intermediate tensor into. It owns its bytes for the length
//! of one benchmark and hands them back to its [`MemoryPool`] when dropped,
//! on the success path and on every early return alike.

use crate::pool::PoolInner;
use crate::{MemoryBudget, MemoryError, MemoryPool, MemoryRegion};
use std::sync::Arc;
use tensor_core::AlignedBuf;

/// A zero-initialised, 8-byte aligned region carved from a pool.
///
/// ```
/// use memory_manager::{MemoryBudget, MemoryPool, ScratchArena};
///
/// let pool = MemoryPool::external(MemoryBudget::from_kb(8));
/// let mut arena = ScratchArena::acquire(&pool, MemoryBudget::from_kb(2)).unwrap();
/// arena.as_bytes_mut()[0] = 0xAB;
/// assert_eq!(arena.size_bytes(), 2048);
/// arena.release();
/// assert_eq!(pool.allocated_bytes(), 0);
/// ```
pub struct ScratchArena {
    buf: AlignedBuf,
    pool: Arc<PoolInner>,
}

impl ScratchArena {
    /// Acquires `size` bytes from `pool`.
    ///
    /// # Errors
    /// [`MemoryError::OutOfMemory`] when the pool's budget or the host
    /// allocator cannot satisfy the request.
    pub fn acquire(pool: &MemoryPool, size: MemoryBudget) -> Result<Self, MemoryError> {
        let (buf, pool) = pool.reserve(size.as_bytes())?;
        Ok(Self { buf, pool })
    }

    /// Returns the arena size in bytes.
    pub fn size_bytes(&self) -> usize {
        self.buf.len()
    }

    /// Returns the memory class the arena was carved from.
    pub fn region(&self) -> MemoryRegion {
        self.pool.region()
    }

    /// Returns the arena contents.
    pub fn as_bytes(&self) -> &[u8] {
        self.buf.as_bytes()
    }

    /// Returns the arena contents mutably.
    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        self.buf.as_bytes_mut()
    }

    /// Explicitly returns the arena to its pool.
    ///
    /// Equivalent to dropping it; reads better at call sites that release
    /// at a specific step.
    pub fn release(self) {
        drop(self);
    }
}

impl Drop for ScratchArena {
    fn drop(&mut self) {
        self.pool.release(self.buf.len());
    }
}

impl std::fmt::Debug for ScratchArena {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScratchArena")
            .field("region", &self.region())
            .field("size_bytes", &self.size_bytes())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_acquire_zeroed_and_aligned() {
        let pool = MemoryPool::external(MemoryBudget::from_kb(4));
        let arena = ScratchArena::acquire(&pool, MemoryBudget::from_bytes(1000)).unwrap();
        assert_eq!(arena.size_bytes(), 1000);
        assert!(arena.as_bytes().iter().all(|&b| b == 0));
        assert_eq!(arena.as_bytes().as_ptr() as usize % 8, 0);
        assert_eq!(arena.region(), MemoryRegion::External);
    }

    #[test]
    fn test_drop_returns_bytes() {
        let pool = MemoryPool::external(MemoryBudget::from_kb(4));
        {
            let _a = ScratchArena::acquire(&pool, MemoryBudget::from_kb(1)).unwrap();
            let _b = ScratchArena::acquire(&pool, MemoryBudget::from_kb(2)).unwrap();
            assert_eq!(pool.allocated_bytes(), 3072);
        }
        assert_eq!(pool.allocated_bytes(), 0);
        let stats = pool.stats();
        assert_eq!(stats.acquires, 2);
        assert_eq!(stats.releases, 2);
        assert_eq!(stats.outstanding(), 0);
        assert_eq!(stats.peak_allocated_bytes, 3072);
    }

    #[test]
    fn test_second_arena_exceeds_budget() {
        let pool = MemoryPool::external(MemoryBudget::from_kb(1));
        let first = ScratchArena::acquire(&pool, MemoryBudget::from_bytes(800)).unwrap();
        assert!(ScratchArena::acquire(&pool, MemoryBudget::from_bytes(800)).is_err());
        first.release();
        assert!(ScratchArena::acquire(&pool, MemoryBudget::from_bytes(800)).is_ok());
    }

    #[test]
    fn test_release_on_early_return() {
        fn fails(pool: &MemoryPool) -> Result<(), MemoryError> {
            let _arena = ScratchArena::acquire(pool, MemoryBudget::from_kb(1))?;
            Err(MemoryError::ZeroSizedAllocation)
        }
        let pool = MemoryPool::external(MemoryBudget::from_kb(2));
        assert!(fails(&pool).is_err());
        assert_eq!(pool.allocated_bytes(), 0);
    }

    #[test]
    fn test_arena_outlives_pool_handle() {
        let pool = MemoryPool::external(MemoryBudget::from_kb(1));
        let arena = ScratchArena::acquire(&pool, MemoryBudget::from_bytes(512)).unwrap();
        drop(pool);
        assert_eq!(arena.size_bytes(), 512);
    }
}
