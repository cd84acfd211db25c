//! The main cache interface.
//!
//! This module provides the primary `HashLru` type that users interact with.
//! It wraps the internal storage and provides a clean, thread-safe API.

use std::borrow::Borrow;
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

use crate::config::CacheConfig;
use crate::error::CacheResult;
use crate::stats::{CacheStats, StatsSnapshot};
use crate::storage::Db;

/// A thread-safe cache that approximates LRU with two rotating generations.
///
/// New keys go into a *recent* generation. When `capacity` distinct keys
/// have been written there, the older *retiring* generation is dropped as a
/// whole and *recent* takes its place. Reading a key that only survives in
/// *retiring* moves it back into *recent*. Every operation is O(1)
/// amortized, at the price of evicting in bulk instead of one entry at a
/// time.
///
/// # Eviction callback
///
/// A callback installed with [`with_evictor`](Self::with_evictor) runs while
/// the cache's write lock is held. It must not call back into the same cache:
/// doing so deadlocks.
///
/// # Example
/// ```
/// use hash_lru::HashLru;
///
/// let cache = HashLru::new(3).unwrap();
///
/// cache.set("a", 1);
/// cache.set("b", 2);
/// cache.set("c", 3); // the recent generation is full and now retires
/// cache.set("d", 4);
///
/// // "a" is still reachable, and reading it refreshes it.
/// assert_eq!(cache.get("a"), Some(1));
/// cache.set("e", 5); // "b" and "c" were never touched and are dropped
///
/// assert!(!cache.contains("b"));
/// assert!(!cache.contains("c"));
/// assert!(cache.contains("a"));
/// ```
pub struct HashLru<K, V> {
    /// Internal storage.
    db: Arc<Db<K, V>>,
}

impl<K, V> HashLru<K, V>
where
    K: Hash + Eq,
{
    /// Create a cache holding roughly `capacity` entries.
    ///
    /// # Errors
    /// [`CacheError::InvalidCapacity`](crate::CacheError::InvalidCapacity)
    /// if `capacity` is zero.
    ///
    /// # Example
    /// ```
    /// use hash_lru::HashLru;
    ///
    /// let cache: HashLru<String, Vec<u8>> = HashLru::new(10_000).unwrap();
    /// assert!(HashLru::<String, Vec<u8>>::new(0).is_err());
    /// ```
    pub fn new(capacity: usize) -> CacheResult<Self> {
        Self::from_config(CacheConfig::new().max_capacity(capacity))
    }

    /// Create a cache that calls `on_evict` for every pair it discards.
    ///
    /// The callback fires on generation rotation, `remove`, `clear` and
    /// shrinking `resize`. Rotation evicts a whole generation at once, so
    /// expect notifications in bursts.
    ///
    /// # Example
    /// ```
    /// use hash_lru::HashLru;
    /// use std::sync::atomic::{AtomicUsize, Ordering};
    /// use std::sync::Arc;
    ///
    /// let evicted = Arc::new(AtomicUsize::new(0));
    /// let counter = Arc::clone(&evicted);
    /// let cache = HashLru::with_evictor(2, move |_key: u32, _value: u32| {
    ///     counter.fetch_add(1, Ordering::Relaxed);
    /// })
    /// .unwrap();
    ///
    /// for i in 0..4 {
    ///     cache.set(i, i);
    /// }
    /// assert_eq!(evicted.load(Ordering::Relaxed), 2);
    /// ```
    pub fn with_evictor<F>(capacity: usize, on_evict: F) -> CacheResult<Self>
    where
        F: Fn(K, V) + Send + Sync + 'static,
    {
        Self::from_config_with_evictor(CacheConfig::new().max_capacity(capacity), on_evict)
    }

    /// Create a cache from a configuration.
    ///
    /// # Example
    /// ```
    /// use hash_lru::{CacheConfig, HashLru};
    ///
    /// let config = CacheConfig::new().max_capacity(512).preallocate(true);
    /// let cache: HashLru<u64, String> = HashLru::from_config(config).unwrap();
    /// assert_eq!(cache.capacity(), 512);
    /// ```
    pub fn from_config(config: CacheConfig) -> CacheResult<Self> {
        Ok(Self {
            db: Arc::new(Db::new(config, None)?),
        })
    }

    /// Create a cache from a configuration with an eviction callback.
    pub fn from_config_with_evictor<F>(config: CacheConfig, on_evict: F) -> CacheResult<Self>
    where
        F: Fn(K, V) + Send + Sync + 'static,
    {
        Ok(Self {
            db: Arc::new(Db::new(config, Some(Box::new(on_evict)))?),
        })
    }

    /// Get a value from the cache.
    ///
    /// A key found only in the retiring generation is promoted into the
    /// recent one, which may rotate the generations.
    ///
    /// # Example
    /// ```
    /// use hash_lru::HashLru;
    ///
    /// let cache = HashLru::new(16).unwrap();
    /// cache.set("key".to_string(), "value");
    ///
    /// assert_eq!(cache.get("key"), Some("value"));
    /// assert_eq!(cache.get("missing"), None);
    /// ```
    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
        V: Clone,
    {
        self.db.get(key)
    }

    /// Get a value without refreshing it.
    ///
    /// # Example
    /// ```
    /// use hash_lru::HashLru;
    ///
    /// let cache = HashLru::new(16).unwrap();
    /// cache.set(1, "one");
    /// assert_eq!(cache.peek(&1), Some("one"));
    /// ```
    pub fn peek<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
        V: Clone,
    {
        self.db.peek(key)
    }

    /// Set a value in the cache.
    ///
    /// Overwriting a key that is already in the recent generation does not
    /// count toward the next rotation.
    pub fn set(&self, key: K, value: V) {
        self.db.set(key, value);
    }

    /// Check if a key exists in the cache. Does not refresh it.
    ///
    /// # Example
    /// ```
    /// use hash_lru::HashLru;
    ///
    /// let cache = HashLru::new(16).unwrap();
    /// assert!(!cache.contains("key"));
    /// cache.set("key", ());
    /// assert!(cache.contains("key"));
    /// ```
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.db.contains(key)
    }

    /// Remove a key from the cache.
    ///
    /// Returns `true` if the key existed. The eviction callback, if any, is
    /// called once for the removed pair.
    ///
    /// # Example
    /// ```
    /// use hash_lru::HashLru;
    ///
    /// let cache = HashLru::new(16).unwrap();
    /// cache.set("key", "value");
    /// assert!(cache.remove("key"));
    /// assert!(!cache.remove("key")); // Already removed
    /// ```
    pub fn remove<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.db.remove(key)
    }

    /// Remove all entries, calling the eviction callback for each.
    pub fn clear(&self) {
        self.db.clear();
    }

    /// Approximate number of entries, never more than [`capacity`](Self::capacity).
    ///
    /// # Example
    /// ```
    /// use hash_lru::HashLru;
    ///
    /// let cache = HashLru::new(100).unwrap();
    /// for i in 0..150 {
    ///     cache.set(i, i);
    /// }
    /// assert_eq!(cache.len(), 100);
    /// ```
    pub fn len(&self) -> usize {
        self.db.len()
    }

    /// Check if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.db.is_empty()
    }

    /// The current capacity.
    pub fn capacity(&self) -> usize {
        self.db.capacity()
    }

    /// Change the capacity, returning how many entries were evicted.
    ///
    /// Growing never evicts. Shrinking evicts `len() - new_capacity`
    /// entries, oldest generation first, notifying the eviction callback for
    /// each.
    ///
    /// # Errors
    /// [`CacheError::InvalidCapacity`](crate::CacheError::InvalidCapacity)
    /// if `new_capacity` is zero. The cache is left unchanged.
    ///
    /// # Example
    /// ```
    /// use hash_lru::HashLru;
    ///
    /// let cache = HashLru::new(2).unwrap();
    /// cache.set(1, 1);
    /// cache.set(2, 2);
    ///
    /// assert_eq!(cache.resize(1), Ok(1));
    /// assert_eq!(cache.resize(2), Ok(0));
    /// assert!(cache.resize(0).is_err());
    /// ```
    pub fn resize(&self, new_capacity: usize) -> CacheResult<usize> {
        self.db.resize(new_capacity)
    }

    /// All distinct keys, in no particular order.
    pub fn keys(&self) -> Vec<K>
    where
        K: Clone,
    {
        self.db.keys()
    }

    /// The values of all distinct keys, in no particular order.
    pub fn values(&self) -> Vec<V>
    where
        V: Clone,
    {
        self.db.values()
    }

    /// All distinct key-value pairs, in no particular order.
    pub fn entries(&self) -> Vec<(K, V)>
    where
        K: Clone,
        V: Clone,
    {
        self.db.entries()
    }

    /// Get a snapshot of the cache statistics.
    pub fn stats(&self) -> StatsSnapshot {
        self.db.stats().snapshot()
    }

    /// Get a reference to the internal statistics counter.
    ///
    /// This is useful for integrating with external metrics systems.
    pub fn stats_ref(&self) -> Arc<CacheStats> {
        self.db.stats()
    }
}

impl<K, V> Clone for HashLru<K, V> {
    /// Another handle to the same cache.
    fn clone(&self) -> Self {
        Self {
            db: Arc::clone(&self.db),
        }
    }
}

impl<K, V> Default for HashLru<K, V>
where
    K: Hash + Eq,
{
    /// A cache with [`DEFAULT_CAPACITY`](crate::DEFAULT_CAPACITY).
    fn default() -> Self {
        let db = match Db::new(CacheConfig::default(), None) {
            Ok(db) => db,
            Err(err) => unreachable!("default capacity is positive: {err}"),
        };
        Self { db: Arc::new(db) }
    }
}

impl<K, V> fmt::Debug for HashLru<K, V>
where
    K: Hash + Eq,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HashLru").field("db", &self.db).finish()
    }
}
