//! Internal storage implementation for the cache.
//!
//! `Db` owns the two generations behind a single read-write lock, together
//! with the eviction callback and the statistics counters. Read-only
//! operations share the lock; anything that can insert, promote, rotate or
//! evict holds it exclusively, including while the callback runs.

use std::borrow::Borrow;
use std::fmt;
use std::hash::Hash;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::config::CacheConfig;
use crate::error::{check_capacity, CacheResult};
use crate::generation::{EvictionSink, Generations};
use crate::resize::Resized;
use crate::stats::CacheStats;

/// Callback invoked with every pair the cache discards.
pub(crate) type Evictor<K, V> = Box<dyn Fn(K, V) + Send + Sync>;

/// Thread-safe wrapper around the generational store.
///
/// This is the internal implementation; users should use `HashLru` instead.
pub(crate) struct Db<K, V> {
    /// Both generations and the fill counter, guarded as one unit.
    generations: RwLock<Generations<K, V>>,

    /// Eviction callback, if any. Runs under the write lock.
    on_evict: Option<Evictor<K, V>>,

    /// Statistics for cache operations.
    stats: Arc<CacheStats>,
}

/// Forwards discarded pairs to the user callback and keeps the counters.
struct Notifier<'a, K, V> {
    on_evict: Option<&'a (dyn Fn(K, V) + Send + Sync)>,
    stats: &'a CacheStats,
}

impl<K, V> EvictionSink<K, V> for Notifier<'_, K, V> {
    fn evicted(&mut self, key: K, value: V) {
        self.stats.record_eviction();
        if let Some(on_evict) = self.on_evict {
            on_evict(key, value);
        }
    }

    fn rotated(&mut self, _retired: usize) {
        self.stats.record_rotation();
    }
}

impl<K, V> Db<K, V>
where
    K: Hash + Eq,
{
    /// Create a new database from a configuration.
    pub fn new(config: CacheConfig, on_evict: Option<Evictor<K, V>>) -> CacheResult<Self> {
        let capacity = check_capacity(config.max_capacity)?;

        Ok(Self {
            generations: RwLock::new(Generations::new(capacity, config.preallocate)),
            on_evict,
            stats: Arc::new(CacheStats::new()),
        })
    }

    /// Insert or overwrite a value.
    pub fn set(&self, key: K, value: V) {
        let mut generations = self.write_lock();
        generations.set(key, value, &mut self.notifier());
        self.stats.record_set();
    }

    /// Get a value, promoting it into the recent generation if needed.
    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
        V: Clone,
    {
        let mut generations = self.write_lock();
        let found = generations.get(key, &mut self.notifier());

        match found {
            Some(_) => self.stats.record_hit(),
            None => self.stats.record_miss(),
        }
        found
    }

    /// Get a value without promoting it.
    pub fn peek<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
        V: Clone,
    {
        self.read_lock().peek(key).cloned()
    }

    /// Check if a key exists in either generation.
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.read_lock().contains(key)
    }

    /// Remove a key, notifying the evictor once if it was present.
    pub fn remove<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let mut generations = self.write_lock();
        let removed = generations.remove(key, &mut self.notifier());
        if removed {
            self.stats.record_remove();
        }
        removed
    }

    /// Approximate number of live entries.
    pub fn len(&self) -> usize {
        self.read_lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.read_lock().capacity()
    }

    /// Remove all entries, notifying the evictor for each.
    pub fn clear(&self) {
        let mut generations = self.write_lock();
        let cleared = generations.clear(&mut self.notifier());
        tracing::debug!(cleared, "cleared cache");
    }

    /// Change the capacity, returning how many entries were evicted.
    pub fn resize(&self, new_capacity: usize) -> CacheResult<usize> {
        let mut generations = self.write_lock();
        let old_capacity = generations.capacity();
        let resized = generations.resize(new_capacity, &mut self.notifier())?;

        self.stats.record_resize();
        match resized {
            Resized::Grew => tracing::debug!(old_capacity, new_capacity, "grew cache"),
            Resized::Shrank(evicted) => {
                tracing::debug!(old_capacity, new_capacity, evicted, "shrank cache")
            }
        }
        Ok(resized.evicted())
    }

    /// Distinct keys across both generations.
    pub fn keys(&self) -> Vec<K>
    where
        K: Clone,
    {
        self.read_lock().iter().map(|(key, _)| key.clone()).collect()
    }

    /// Values of the distinct keys across both generations.
    pub fn values(&self) -> Vec<V>
    where
        V: Clone,
    {
        self.read_lock()
            .iter()
            .map(|(_, value)| value.clone())
            .collect()
    }

    /// Distinct pairs across both generations.
    pub fn entries(&self) -> Vec<(K, V)>
    where
        K: Clone,
        V: Clone,
    {
        self.read_lock()
            .iter()
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }

    /// Get a reference to the statistics.
    pub fn stats(&self) -> Arc<CacheStats> {
        Arc::clone(&self.stats)
    }

    pub fn has_evictor(&self) -> bool {
        self.on_evict.is_some()
    }

    // Private helper methods

    fn notifier(&self) -> Notifier<'_, K, V> {
        Notifier {
            on_evict: self.on_evict.as_deref(),
            stats: &self.stats,
        }
    }

    /// Acquire a read lock, recovering it if a callback panicked.
    fn read_lock(&self) -> RwLockReadGuard<'_, Generations<K, V>> {
        self.generations.read().unwrap_or_else(|poisoned| {
            tracing::warn!("recovering cache lock poisoned by a panicking eviction callback");
            PoisonError::into_inner(poisoned)
        })
    }

    /// Acquire a write lock, recovering it if a callback panicked.
    ///
    /// Every mutation finishes before the callback sees a pair, so the
    /// store behind a poisoned lock is still consistent.
    fn write_lock(&self) -> RwLockWriteGuard<'_, Generations<K, V>> {
        self.generations.write().unwrap_or_else(|poisoned| {
            tracing::warn!("recovering cache lock poisoned by a panicking eviction callback");
            PoisonError::into_inner(poisoned)
        })
    }
}

impl<K, V> fmt::Debug for Db<K, V>
where
    K: Hash + Eq,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Db")
            .field("len", &self.len())
            .field("capacity", &self.capacity())
            .field("has_evictor", &self.has_evictor())
            .field("stats", &self.stats)
            .finish()
    }
}
