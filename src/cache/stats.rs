//! Cache Statistics Module
//!
//! Lock-free hit/miss bookkeeping shared by every namespace view of a
//! cache. Counters are relaxed atomics; a snapshot is a plain copy that
//! can be serialized or diffed.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

// == Live Counters ==
/// Running counters for one cache instance.
#[derive(Debug, Default)]
pub struct CacheStats {
    hits: AtomicU64,
    misses: AtomicU64,
    writes: AtomicU64,
    evictions: AtomicU64,
    expirations: AtomicU64,
}

impl CacheStats {
    pub(crate) fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_write(&self) {
        self.writes.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_eviction(&self) {
        self.evictions.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_expiration(&self) {
        self.expirations.fetch_add(1, Ordering::Relaxed);
    }

    /// Copies the current counter values into an immutable snapshot.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            writes: self.writes.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            expirations: self.expirations.load(Ordering::Relaxed),
        }
    }
}

// == Snapshot ==
/// Point-in-time view of the counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    pub hits: u64,
    pub misses: u64,
    pub writes: u64,
    pub evictions: u64,
    pub expirations: u64,
}

impl StatsSnapshot {
    /// Fraction of lookups that hit, in `0.0..=1.0`. Zero lookups rate as
    /// `0.0`.
    pub fn hit_rate(&self) -> f64 {
        let lookups = self.hits + self.misses;
        if lookups == 0 {
            0.0
        } else {
            self.hits as f64 / lookups as f64
        }
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_accumulate() {
        let stats = CacheStats::default();
        stats.record_hit();
        stats.record_hit();
        stats.record_miss();
        stats.record_write();
        stats.record_eviction();
        stats.record_expiration();

        let snap = stats.snapshot();
        assert_eq!(snap.hits, 2);
        assert_eq!(snap.misses, 1);
        assert_eq!(snap.writes, 1);
        assert_eq!(snap.evictions, 1);
        assert_eq!(snap.expirations, 1);
    }

    #[test]
    fn test_hit_rate_with_no_lookups() {
        let snap = CacheStats::default().snapshot();
        assert_eq!(snap.hit_rate(), 0.0);
    }

    #[test]
    fn test_hit_rate() {
        let stats = CacheStats::default();
        for _ in 0..3 {
            stats.record_hit();
        }
        stats.record_miss();
        assert_eq!(stats.snapshot().hit_rate(), 0.75);
    }

    #[test]
    fn test_snapshot_is_detached() {
        let stats = CacheStats::default();
        let before = stats.snapshot();
        stats.record_hit();

        assert_eq!(before.hits, 0);
        assert_eq!(stats.snapshot().hits, 1);
    }

    #[test]
    fn test_snapshot_serializes() {
        let snap = CacheStats::default().snapshot();
        let json = serde_json::to_value(&snap).unwrap();
        assert_eq!(json["hits"], 0);
        assert_eq!(json["misses"], 0);
    }
}
