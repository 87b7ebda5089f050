//! Allocation statistics (`stats` feature)
use arrayvec::ArrayVec;

use crate::MAX_SEGMENTS;

/// Per-segment counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SegmentStats {
    /// The number of allocations served by this segment.
    pub allocs: u32,
    /// The number of cells currently in use.
    pub in_use: u8,
    /// The highest value `in_use` has ever reached.
    pub peak_in_use: u8,
}

impl SegmentStats {
    #[inline]
    pub(crate) fn record_alloc(&mut self) {
        self.allocs = self.allocs.saturating_add(1);
        self.in_use += 1;
        self.peak_in_use = self.peak_in_use.max(self.in_use);
    }

    #[inline]
    pub(crate) fn record_release(&mut self) {
        debug_assert_ne!(self.in_use, 0);
        self.in_use -= 1;
    }
}

/// Pool-wide counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct Counters {
    pub(crate) total_allocs: u32,
    pub(crate) failed_allocs: u32,
}

impl Counters {
    #[inline]
    pub(crate) fn record_alloc(&mut self) {
        self.total_allocs = self.total_allocs.saturating_add(1);
    }

    #[inline]
    pub(crate) fn record_failure(&mut self) {
        self.failed_allocs = self.failed_allocs.saturating_add(1);
    }
}

/// A snapshot of a pool's statistics, returned by
/// [`MemPool::stats`](crate::MemPool::stats).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// The number of successful allocations.
    pub total_allocs: u32,
    /// The number of failed allocations.
    pub failed_allocs: u32,
    /// Per-segment counters, in ascending order of cell size.
    pub segments: ArrayVec<SegmentStats, MAX_SEGMENTS>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn peak_tracks_maximum() {
        let mut stats = SegmentStats::default();
        stats.record_alloc();
        stats.record_alloc();
        stats.record_alloc();
        stats.record_release();
        stats.record_release();
        stats.record_alloc();
        assert_eq!(
            stats,
            SegmentStats {
                allocs: 4,
                in_use: 2,
                peak_in_use: 3,
            }
        );
    }

    #[test]
    fn counters_saturate() {
        let mut counters = Counters {
            total_allocs: u32::MAX,
            failed_allocs: u32::MAX - 1,
        };
        counters.record_alloc();
        counters.record_failure();
        counters.record_failure();
        assert_eq!(counters.total_allocs, u32::MAX);
        assert_eq!(counters.failed_allocs, u32::MAX);
    }
}
