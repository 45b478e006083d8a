use std::sync::atomic::{AtomicU64, Ordering};

/// Counters collected since the previous call to [`LruCache::stats`](crate::LruCache::stats).
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
pub struct Stats {
    pub miss_count: u64,
    pub hit_count: u64,
    pub eviction_count: u64,
    pub failed_write_count: u64,
    pub millis_elapsed: u128,
}

#[derive(Debug, Default)]
pub(crate) struct Counters {
    hit_count: AtomicU64,
    miss_count: AtomicU64,
    eviction_count: AtomicU64,
    failed_write_count: AtomicU64,
}

impl Counters {
    pub(crate) fn increment_hit_count(&self) {
        self.hit_count.fetch_add(1, Ordering::AcqRel);
    }

    pub(crate) fn increment_miss_count(&self) {
        self.miss_count.fetch_add(1, Ordering::AcqRel);
    }

    pub(crate) fn add_eviction_count(&self, evicted: u64) {
        if evicted > 0 {
            self.eviction_count.fetch_add(evicted, Ordering::AcqRel);
        }
    }

    pub(crate) fn increment_failed_write_count(&self) {
        self.failed_write_count.fetch_add(1, Ordering::AcqRel);
    }

    /// Returns the current values and zeroes every counter.
    pub(crate) fn take(&self) -> Stats {
        Stats {
            hit_count: self.hit_count.swap(0, Ordering::AcqRel),
            miss_count: self.miss_count.swap(0, Ordering::AcqRel),
            eviction_count: self.eviction_count.swap(0, Ordering::AcqRel),
            failed_write_count: self.failed_write_count.swap(0, Ordering::AcqRel),
            millis_elapsed: 0,
        }
    }
}
