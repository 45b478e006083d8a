use crate::Stats;
use crate::error::{CacheError, Result};
use parking_lot::Mutex;
use stats::Counters;
use std::borrow::Borrow;
use std::hash::{BuildHasher, Hash};
use std::time::Instant;
use store::Store;
use tracing::trace;

mod entry;
mod recency_list;
pub(crate) mod stats;
mod store;

pub(crate) type RandomState = ahash::RandomState;

/// Thread-safe, resizable least-recently-used cache.
///
/// A single mutex covers both the key map and the recency order, since every successful lookup
/// reorders entries. Values are cloned on the way out; wrap expensive artifacts in
/// [`std::sync::Arc`].
///
/// A capacity of zero means the cache is unbounded until [`LruCache::set_capacity`] establishes a
/// positive bound.
#[derive(Debug)]
pub struct LruCache<K, V, S = RandomState> {
    store: Mutex<Store<K, V, S>>,
    counters: Counters,
    metrics_last_accessed: Mutex<Instant>,
}

impl<K, V> LruCache<K, V, RandomState>
where
    K: Clone + Eq + Hash,
    V: Clone,
{
    /// Creates a new cache holding at most `capacity` entries.
    pub fn with_capacity(capacity: usize) -> LruCache<K, V, RandomState> {
        LruCache::with_capacity_and_hasher(capacity, Default::default())
    }
}

impl<K, V, S> LruCache<K, V, S>
where
    K: Clone + Eq + Hash,
    V: Clone,
    S: BuildHasher,
{
    /// Creates a new cache holding at most `capacity` entries, using `hash_builder` to hash the
    /// keys.
    pub fn with_capacity_and_hasher(capacity: usize, hash_builder: S) -> LruCache<K, V, S> {
        Self {
            store: Mutex::new(Store::with_capacity_and_hasher(capacity, hash_builder)),
            counters: Counters::default(),
            metrics_last_accessed: Mutex::new(Instant::now()),
        }
    }

    /// Inserts or replaces the value for `key` and marks it most recently used.
    ///
    /// Least recently used entries are evicted until the cache is within capacity again.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::WriteFailed`] if the internal bookkeeping rejects the write. The
    /// value is not cached in that case.
    pub fn set(&self, key: K, value: V) -> Result<()> {
        let result = self.store.lock().insert(key, value);

        match result {
            Ok(evicted) => {
                if evicted > 0 {
                    trace!(evicted, "evicted least recently used entries on insert");
                }
                self.counters.add_eviction_count(evicted as u64);
                Ok(())
            }
            Err(err) => {
                self.counters.increment_failed_write_count();
                Err(err)
            }
        }
    }

    /// Returns a clone of the value for `key` and marks it most recently used.
    ///
    /// This never computes a missing value; on [`CacheError::Miss`] the caller is expected to
    /// build the artifact and [`set`](LruCache::set) it.
    pub fn get_if_present<Q>(&self, key: &Q) -> Result<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let value = self.store.lock().get(key);

        match value {
            Some(value) => {
                self.counters.increment_hit_count();
                Ok(value)
            }
            None => {
                self.counters.increment_miss_count();
                Err(CacheError::Miss)
            }
        }
    }

    /// Returns `true` if `key` is cached, without touching its recency.
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.store.lock().contains(key)
    }

    /// Removes `key` and returns its value, if it was cached.
    pub fn remove<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.store.lock().remove(key)
    }

    /// Changes the capacity. Zero is ignored and leaves both the capacity and the contents
    /// unchanged.
    ///
    /// When shrinking, least recently used entries are evicted before this returns. Readers that
    /// already obtained a value keep their clone.
    pub fn set_capacity(&self, capacity: usize) {
        let evicted = self.store.lock().set_capacity(capacity);

        if evicted > 0 {
            trace!(capacity, evicted, "evicted entries after shrinking capacity");
        }
        self.counters.add_eviction_count(evicted as u64);
    }
}

impl<K, V, S> LruCache<K, V, S> {
    /// Current capacity; zero while unbounded.
    pub fn capacity(&self) -> usize {
        self.store.lock().capacity()
    }

    pub fn len(&self) -> usize {
        self.store.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops every entry. The capacity is kept.
    pub fn clear(&self) {
        self.store.lock().clear();
    }

    /// Returns the counters collected since the previous call and resets them.
    pub fn stats(&self) -> Stats {
        let millis_elapsed = {
            let mut guard = self.metrics_last_accessed.lock();
            let millis_elapsed = guard.elapsed().as_millis();
            *guard = Instant::now();
            millis_elapsed
        };

        Stats {
            millis_elapsed,
            ..self.counters.take()
        }
    }
}
