//! The two-generation store behind the cache.
//!
//! Entries are written into the *recent* generation. Once `max_size`
//! distinct keys have landed there, the generations rotate: everything in
//! the *retiring* generation is evicted, *recent* takes its place and a
//! fresh, empty *recent* starts filling. Reading a key out of *retiring*
//! promotes it back into *recent*, which is how recency is approximated
//! without tracking an access order.
//!
//! This type is single-threaded; `storage::Db` puts it behind a lock.

use indexmap::IndexMap;
use std::borrow::Borrow;
use std::hash::Hash;
use std::mem;

/// Receives pairs as the store discards them.
///
/// Any `FnMut(K, V)` closure is a sink; `rotated` is then a no-op.
pub(crate) trait EvictionSink<K, V> {
    /// A pair has been permanently dropped from the store.
    fn evicted(&mut self, key: K, value: V);

    /// A rotation completed after retiring `retired` pairs.
    fn rotated(&mut self, _retired: usize) {}
}

impl<K, V, F> EvictionSink<K, V> for F
where
    F: FnMut(K, V),
{
    fn evicted(&mut self, key: K, value: V) {
        self(key, value)
    }
}

/// A pair of generations plus the fill counter that drives rotation.
#[derive(Debug, Clone)]
pub(crate) struct Generations<K, V> {
    /// Actively written generation. Authoritative for keys it holds.
    pub(crate) recent: IndexMap<K, V>,

    /// Previous `recent`, frozen until the next rotation discards it.
    /// May hold stale copies of keys that were since re-set in `recent`.
    pub(crate) retiring: IndexMap<K, V>,

    /// Distinct keys inserted into `recent` since the last rotation.
    pub(crate) size: usize,

    pub(crate) max_size: usize,

    pub(crate) preallocate: bool,
}

impl<K, V> Generations<K, V>
where
    K: Hash + Eq,
{
    /// Create an empty store. `max_size` must already be validated.
    pub(crate) fn new(max_size: usize, preallocate: bool) -> Self {
        debug_assert!(max_size > 0);
        let mut generations = Self {
            recent: IndexMap::new(),
            retiring: IndexMap::new(),
            size: 0,
            max_size,
            preallocate,
        };
        generations.recent = generations.fresh_generation();
        generations.retiring = generations.fresh_generation();
        generations
    }

    /// An empty generation, sized for `max_size` entries when preallocating.
    pub(crate) fn fresh_generation(&self) -> IndexMap<K, V> {
        self.generation_for(self.max_size)
    }

    /// An empty generation, sized for `capacity` entries when preallocating.
    pub(crate) fn generation_for(&self, capacity: usize) -> IndexMap<K, V> {
        let mut generation = IndexMap::new();
        if self.preallocate {
            preallocate(&mut generation, capacity);
        }
        generation
    }

    pub(crate) fn capacity(&self) -> usize {
        self.max_size
    }

    /// Insert or overwrite `key`.
    ///
    /// Overwriting a key already in `recent` never counts toward rotation.
    pub(crate) fn set<S>(&mut self, key: K, value: V, sink: &mut S)
    where
        S: EvictionSink<K, V>,
    {
        if let Some(slot) = self.recent.get_mut(&key) {
            *slot = value;
            return;
        }
        self.promote(key, value, sink);
    }

    /// Look up `key`, promoting it out of `retiring` on a hit there.
    pub(crate) fn get<Q, S>(&mut self, key: &Q, sink: &mut S) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
        V: Clone,
        S: EvictionSink<K, V>,
    {
        if let Some(value) = self.recent.get(key) {
            return Some(value.clone());
        }

        let (key, value) = self.retiring.swap_remove_entry(key)?;
        let found = value.clone();
        self.promote(key, value, sink);
        Some(found)
    }

    /// Look up `key` in either generation without touching anything.
    pub(crate) fn peek<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.recent.get(key).or_else(|| self.retiring.get(key))
    }

    pub(crate) fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.recent.contains_key(key) || self.retiring.contains_key(key)
    }

    /// Drop `key` from both generations.
    ///
    /// The sink sees exactly one pair: the `recent` one if the key lived
    /// there, otherwise the `retiring` one. A stale shadow left behind in
    /// `retiring` goes with it so the key is really gone.
    pub(crate) fn remove<Q, S>(&mut self, key: &Q, sink: &mut S) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
        S: EvictionSink<K, V>,
    {
        let current = self.recent.swap_remove_entry(key);
        if current.is_some() {
            self.size = self.size.saturating_sub(1);
        }
        let stale = self.retiring.swap_remove_entry(key);

        match current.or(stale) {
            Some((key, value)) => {
                sink.evicted(key, value);
                true
            }
            None => false,
        }
    }

    /// Empty both generations, retiring first, and return how many pairs
    /// were handed to the sink.
    pub(crate) fn clear<S>(&mut self, sink: &mut S) -> usize
    where
        S: EvictionSink<K, V>,
    {
        let (fresh_retiring, fresh_recent) = (self.fresh_generation(), self.fresh_generation());
        let retiring = mem::replace(&mut self.retiring, fresh_retiring);
        let recent = mem::replace(&mut self.recent, fresh_recent);
        self.size = 0;

        let cleared = retiring.len() + recent.len();
        for (key, value) in retiring.into_iter().chain(recent) {
            sink.evicted(key, value);
        }
        cleared
    }

    /// Approximate number of distinct live keys, never above `max_size`.
    pub(crate) fn len(&self) -> usize {
        if self.size == 0 {
            return self.retiring.len().min(self.max_size);
        }

        let unshadowed = self
            .retiring
            .keys()
            .filter(|key| !self.recent.contains_key(*key))
            .count();

        (self.size + unshadowed).min(self.max_size)
    }

    /// Every distinct pair: unshadowed `retiring` entries, then `recent`.
    pub(crate) fn iter(&self) -> impl Iterator<Item = (&K, &V)> + '_ {
        self.retiring
            .iter()
            .filter(move |(key, _)| !self.recent.contains_key(*key))
            .chain(self.recent.iter())
    }

    /// Insert a key known to be absent from `recent`, rotating if the
    /// fill counter hits capacity.
    fn promote<S>(&mut self, key: K, value: V, sink: &mut S)
    where
        S: EvictionSink<K, V>,
    {
        self.recent.insert(key, value);
        self.size += 1;

        if self.size >= self.max_size {
            self.rotate(sink);
        }
    }

    /// Retire `recent` and discard the old `retiring` generation.
    ///
    /// The store is consistent again before the sink runs; a panicking sink
    /// only loses the notifications it had not reached yet.
    fn rotate<S>(&mut self, sink: &mut S)
    where
        S: EvictionSink<K, V>,
    {
        let fresh = self.fresh_generation();
        let retired = mem::replace(&mut self.retiring, mem::replace(&mut self.recent, fresh));
        self.size = 0;

        let count = retired.len();
        tracing::trace!(
            retired = count,
            capacity = self.max_size,
            "rotated cache generations"
        );

        for (key, value) in retired {
            sink.evicted(key, value);
        }
        sink.rotated(count);
    }
}

/// Reserve room for `additional` more entries in `generation`.
///
/// A reservation the allocator refuses leaves the map as it is; it then
/// grows on demand like an unpreallocated one.
pub(crate) fn preallocate<K, V>(generation: &mut IndexMap<K, V>, additional: usize)
where
    K: Hash + Eq,
{
    if let Err(err) = generation.try_reserve(additional) {
        tracing::warn!(
            requested = additional,
            error = %err,
            "could not preallocate cache generation, growing on demand"
        );
    }
}
