// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Pool usage counters.

/// Cumulative statistics about a memory pool.
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct AllocationStats {
    /// Successful arena acquisitions.
    pub acquires: u64,
    /// Arenas returned to the pool.
    pub releases: u64,
    /// Requests refused for lack of memory.
    pub oom_count: u64,
    /// Largest number of bytes held at once.
    pub peak_allocated_bytes: usize,
    /// Total bytes ever handed out.
    pub cumulative_allocated_bytes: u64,
}

impl AllocationStats {
    /// Returns the number of arenas acquired but not yet released.
    pub fn outstanding(&self) -> u64 {
        self.acquires.saturating_sub(self.releases)
    }

    pub(crate) fn record_acquire(&mut self, size: usize) {
        self.acquires += 1;
        self.cumulative_allocated_bytes += size as u64;
    }

    pub(crate) fn record_release(&mut self) {
        self.releases += 1;
    }

    pub(crate) fn record_oom(&mut self) {
        self.oom_count += 1;
    }

    pub(crate) fn update_peak(&mut self, current_bytes: usize) {
        self.peak_allocated_bytes = self.peak_allocated_bytes.max(current_bytes);
    }

    /// Returns a human-readable summary.
    pub fn summary(&self) -> String {
        format!(
            "{} acquired, {} released, {} refused, peak {:.1} KB",
            self.acquires,
            self.releases,
            self.oom_count,
            self.peak_allocated_bytes as f64 / 1024.0,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default() {
        let s = AllocationStats::default();
        assert_eq!(s.acquires, 0);
        assert_eq!(s.outstanding(), 0);
    }

    #[test]
    fn test_peak_tracking() {
        let mut s = AllocationStats::default();
        s.update_peak(100);
        s.update_peak(50);
        assert_eq!(s.peak_allocated_bytes, 100);
        s.update_peak(200);
        assert_eq!(s.peak_allocated_bytes, 200);
    }

    #[test]
    fn test_outstanding() {
        let mut s = AllocationStats::default();
        s.record_acquire(1000);
        s.record_acquire(500);
        s.record_release();
        assert_eq!(s.outstanding(), 1);
        assert_eq!(s.cumulative_allocated_bytes, 1500);
    }

    #[test]
    fn test_summary() {
        let mut s = AllocationStats::default();
        s.record_acquire(716_800);
        s.update_peak(716_800);
        s.record_oom();
        let summary = s.summary();
        assert!(summary.contains("1 acquired"));
        assert!(summary.contains("1 refused"));
        assert!(summary.contains("700.0 KB"));
    }
}
