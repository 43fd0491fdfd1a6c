//! Cache statistics.

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters for cache operations.
///
/// All counters are atomic and can be safely read from any thread. They
/// are never consulted when matching watches.
#[derive(Debug, Default)]
pub struct CacheStats {
    /// Snapshots installed.
    snapshots_set: AtomicU64,
    /// Snapshot lookups that found one.
    snapshot_hits: AtomicU64,
    /// Snapshot lookups that found none.
    snapshot_misses: AtomicU64,
    /// Groups cleared, manually or by the reclaimer.
    groups_cleared: AtomicU64,
    /// Watch callbacks invoked.
    responses_sent: AtomicU64,
    /// Watches left pending.
    watches_parked: AtomicU64,
}

impl CacheStats {
    /// Create new cache statistics.
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub(crate) fn record_set(&self) {
        self.snapshots_set.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_hit(&self) {
        self.snapshot_hits.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_miss(&self) {
        self.snapshot_misses.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_clear(&self) {
        self.groups_cleared.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_responses(&self, count: u64) {
        self.responses_sent.fetch_add(count, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_parked(&self) {
        self.watches_parked.fetch_add(1, Ordering::Relaxed);
    }

    /// Get total snapshots set.
    #[inline]
    pub fn snapshots_set(&self) -> u64 {
        self.snapshots_set.load(Ordering::Relaxed)
    }

    /// Get total snapshot hits.
    #[inline]
    pub fn snapshot_hits(&self) -> u64 {
        self.snapshot_hits.load(Ordering::Relaxed)
    }

    /// Get total snapshot misses.
    #[inline]
    pub fn snapshot_misses(&self) -> u64 {
        self.snapshot_misses.load(Ordering::Relaxed)
    }

    /// Get total groups cleared.
    #[inline]
    pub fn groups_cleared(&self) -> u64 {
        self.groups_cleared.load(Ordering::Relaxed)
    }

    /// Get total responses sent.
    #[inline]
    pub fn responses_sent(&self) -> u64 {
        self.responses_sent.load(Ordering::Relaxed)
    }

    /// Get total watches parked.
    #[inline]
    pub fn watches_parked(&self) -> u64 {
        self.watches_parked.load(Ordering::Relaxed)
    }

    /// Calculate hit rate (0.0 to 1.0).
    pub fn hit_rate(&self) -> f64 {
        let hits = self.snapshot_hits() as f64;
        let total = hits + self.snapshot_misses() as f64;
        if total == 0.0 {
            0.0
        } else {
            hits / total
        }
    }

    /// Reset all statistics.
    pub fn reset(&self) {
        for counter in [
            &self.snapshots_set,
            &self.snapshot_hits,
            &self.snapshot_misses,
            &self.groups_cleared,
            &self.responses_sent,
            &self.watches_parked,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }
}
