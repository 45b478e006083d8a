use crate::cache::RandomState;
use crate::cache::entry::Entry;
use crate::cache::recency_list::RecencyList;
use crate::error::{CacheError, Result};
use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::{BuildHasher, Hash};

/// Unsynchronized LRU bookkeeping. [`LruCache`](crate::LruCache) guards it with a single mutex.
///
/// A capacity of zero means no bound has been established yet and nothing is evicted.
#[derive(Debug)]
pub(crate) struct Store<K, V, S = RandomState> {
    capacity: usize,
    entry_pointers: HashMap<K, usize, S>,
    recency: RecencyList<Entry<K, V>>,
}

impl<K, V, S> Store<K, V, S>
where
    S: BuildHasher,
{
    pub(crate) fn with_capacity_and_hasher(capacity: usize, hash_builder: S) -> Self {
        Self {
            capacity,
            entry_pointers: HashMap::with_hasher(hash_builder),
            recency: RecencyList::new(),
        }
    }
}

impl<K, V, S> Store<K, V, S> {
    pub(crate) fn capacity(&self) -> usize {
        self.capacity
    }

    pub(crate) fn len(&self) -> usize {
        self.entry_pointers.len()
    }

    pub(crate) fn clear(&mut self) {
        self.entry_pointers.clear();
        self.recency.clear();
    }
}

impl<K, V, S> Store<K, V, S>
where
    K: Clone + Eq + Hash,
    S: BuildHasher,
    V: Clone,
{
    /// Inserts or replaces `key` and marks it most recently used. Returns the number of entries
    /// evicted to stay within capacity.
    pub(crate) fn insert(&mut self, key: K, value: V) -> Result<usize> {
        if let Some(&index) = self.entry_pointers.get(&key) {
            let Some(entry) = self.recency.get_mut(index) else {
                self.entry_pointers.remove(&key);
                return Err(CacheError::WriteFailed(format!(
                    "entry pointer {index} refers to a vacant slot"
                )));
            };
            entry.replace_value(value);
            self.recency.move_to_back(index);
            return Ok(0);
        }

        let index = self.recency.push_back(Entry::new(key.clone(), value));
        self.entry_pointers.insert(key, index);

        Ok(self.evict_down_to(self.capacity))
    }

    pub(crate) fn get<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let index = *self.entry_pointers.get(key)?;
        self.recency.move_to_back(index);
        self.recency.get(index).map(|entry| entry.value().clone())
    }

    pub(crate) fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.entry_pointers.contains_key(key)
    }

    pub(crate) fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let index = self.entry_pointers.remove(key)?;
        self.recency.remove(index).map(Entry::into_value)
    }

    /// Applies a new capacity and evicts synchronously. Zero leaves the store untouched.
    pub(crate) fn set_capacity(&mut self, capacity: usize) -> usize {
        if capacity == 0 {
            return 0;
        }

        self.capacity = capacity;
        self.evict_down_to(capacity)
    }

    fn evict_down_to(&mut self, limit: usize) -> usize {
        if limit == 0 {
            return 0;
        }

        let mut evicted = 0;
        while self.recency.len() > limit {
            let Some(entry) = self.recency.pop_front() else {
                break;
            };
            self.entry_pointers.remove(entry.key());
            evicted += 1;
        }

        evicted
    }
}
