use crate::Result;

use dashmap::DashMap;
use once_cell::sync::OnceCell;

use std::{fmt, hash::Hash, sync::Arc};

/// A concurrency-safe memoization table.
///
/// Each key is computed at most once. Callers racing on an unseen key block on
/// the same cell until the single computation finishes, then all receive the
/// same `Arc`. Reads of already computed keys only take a shard read lock.
///
/// Cloning a `Cache` yields another handle to the same table. There is no
/// eviction: entries live as long as the last handle.
pub struct Cache<K, V> {
    name: &'static str,
    entries: Arc<DashMap<K, Arc<OnceCell<Arc<V>>>>>,
}

impl<K, V> Cache<K, V>
where
    K: Eq + Hash + fmt::Debug,
{
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            entries: Arc::new(DashMap::new()),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Returns the value stored under `key`, computing and storing it first if
    /// needed. `compute` is never invoked for a key that already has a value.
    pub fn fetch_or_store(&self, key: K, compute: impl FnOnce() -> V) -> Arc<V> {
        let cell = self.cell(key);
        cell.get_or_init(|| Arc::new(compute())).clone()
    }

    /// Fallible variant of [`fetch_or_store`](Self::fetch_or_store).
    ///
    /// A failed computation stores nothing; the next caller for the same key
    /// computes again.
    pub fn try_fetch_or_store(
        &self,
        key: K,
        compute: impl FnOnce() -> Result<V>,
    ) -> Result<Arc<V>>
    where
        K: Clone,
    {
        let cell = self.cell(key.clone());

        match cell.get_or_try_init(|| compute().map(Arc::new)) {
            Ok(value) => Ok(value.clone()),
            Err(err) => {
                // Drop the empty cell unless another caller is waiting on it.
                // The shard write lock keeps new callers from cloning it
                // meanwhile.
                self.entries.remove_if(&key, |_, stored| {
                    stored.get().is_none() && Arc::strong_count(stored) == 2
                });
                Err(err)
            }
        }
    }

    /// Returns the stored value, if the key has been computed.
    pub fn get(&self, key: &K) -> Option<Arc<V>> {
        self.entries.get(key)?.get().cloned()
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.get(key).is_some()
    }

    /// Number of computed entries.
    pub fn len(&self) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.value().get().is_some())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns `true` if both handles refer to the same table.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.entries, &other.entries)
    }

    fn cell(&self, key: K) -> Arc<OnceCell<Arc<V>>> {
        // The shard guard is released before the cell is initialized so a
        // computation may itself use the cache.
        if let Some(cell) = self.entries.get(&key) {
            return cell.clone();
        }

        tracing::trace!(cache = self.name, key = ?key, "cache miss");
        self.entries.entry(key).or_default().clone()
    }
}

impl<K, V> Clone for Cache<K, V> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            entries: self.entries.clone(),
        }
    }
}

impl<K: Eq + Hash, V> fmt::Debug for Cache<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cache")
            .field("name", &self.name)
            .field("entries", &self.entries.len())
            .finish()
    }
}
