//! Runtime capacity changes for [`Generations`].
//!
//! Growing folds both generations into `recent` so that every live key keeps
//! a full generation of life under the new bound. Shrinking flattens the
//! live entries, evicts the oldest-looking ones and freezes the rest into
//! `retiring`.

use std::hash::Hash;
use std::mem;

use crate::error::{check_capacity, CacheResult};
use crate::generation::{preallocate, EvictionSink, Generations};

/// What a successful resize did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Resized {
    /// Capacity grew or stayed put; nothing was evicted.
    Grew,
    /// Capacity shrank and this many pairs were evicted.
    Shrank(usize),
}

impl Resized {
    pub(crate) fn evicted(self) -> usize {
        match self {
            Resized::Grew => 0,
            Resized::Shrank(evicted) => evicted,
        }
    }
}

impl<K, V> Generations<K, V>
where
    K: Hash + Eq,
{
    /// Change the capacity to `new_capacity`.
    ///
    /// # Errors
    /// `CacheError::InvalidCapacity` when `new_capacity` is zero; the store
    /// is not touched in that case.
    pub(crate) fn resize<S>(&mut self, new_capacity: usize, sink: &mut S) -> CacheResult<Resized>
    where
        S: EvictionSink<K, V>,
    {
        check_capacity(new_capacity)?;

        let total = self.len();
        if new_capacity >= total {
            self.grow(new_capacity, total);
            Ok(Resized::Grew)
        } else {
            Ok(Resized::Shrank(self.shrink(new_capacity, total, sink)))
        }
    }

    /// Merge `retiring` into `recent`, `recent` winning on conflicts.
    ///
    /// `max_size` and the fill counter change only once both new generations
    /// exist.
    fn grow(&mut self, new_capacity: usize, total: usize) {
        let mut merged = mem::take(&mut self.recent);
        for (key, value) in mem::take(&mut self.retiring) {
            merged.entry(key).or_insert(value);
        }
        if self.preallocate {
            let spare = new_capacity.saturating_sub(merged.len());
            preallocate(&mut merged, spare);
        }
        let retiring = self.generation_for(new_capacity);

        self.recent = merged;
        self.retiring = retiring;
        self.max_size = new_capacity;
        self.size = total;
    }

    /// Evict `total - new_capacity` live pairs and retire the rest.
    ///
    /// Unshadowed `retiring` entries come first, in insertion order, so they
    /// are the first to go.
    fn shrink<S>(&mut self, new_capacity: usize, total: usize, sink: &mut S) -> usize
    where
        S: EvictionSink<K, V>,
    {
        let retiring = mem::take(&mut self.retiring);
        let mut recent = mem::take(&mut self.recent);

        let mut live: Vec<(K, V)> = retiring
            .into_iter()
            .filter(|(key, _)| !recent.contains_key(key))
            .collect();
        live.extend(recent.drain(..));

        let evict = (total - new_capacity).min(live.len());
        let kept = live.split_off(evict);

        self.max_size = new_capacity;
        self.size = 0;
        self.recent = self.fresh_generation();
        let mut retained = self.fresh_generation();
        retained.extend(kept);
        self.retiring = retained;

        for (key, value) in live {
            sink.evicted(key, value);
        }
        evict
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CacheError;

    fn sink() -> impl FnMut(u32, u32) {
        |_, _| {}
    }

    fn collect(out: &mut Vec<(u32, u32)>) -> impl FnMut(u32, u32) + '_ {
        move |k, v| out.push((k, v))
    }

    fn filled(capacity: usize, keys: std::ops::Range<u32>) -> Generations<u32, u32> {
        let mut store = Generations::new(capacity, false);
        for key in keys {
            store.set(key, key, &mut sink());
        }
        store
    }

    #[test]
    fn test_zero_capacity_is_rejected() {
        let mut store = filled(4, 0..3);
        let before = store.clone();

        let result = store.resize(0, &mut sink());
        assert_eq!(result, Err(CacheError::InvalidCapacity(0)));
        assert_eq!(store.max_size, before.max_size);
        assert_eq!(store.size, before.size);
        assert_eq!(store.recent, before.recent);
        assert_eq!(store.retiring, before.retiring);
    }

    #[test]
    fn test_shrink_evicts_difference() {
        let mut evicted = Vec::new();
        let mut store = filled(2, 1..3);
        assert_eq!(store.len(), 2);

        let resized = store.resize(1, &mut collect(&mut evicted)).unwrap();
        assert_eq!(resized, Resized::Shrank(1));
        assert_eq!(evicted.len(), 1);
        assert_eq!(store.len(), 1);
        assert_eq!(store.capacity(), 1);
        assert!(store.recent.is_empty());
        assert_eq!(store.size, 0);

        // The evicted key is gone, the other one survives.
        let (gone, _) = evicted[0];
        assert!(!store.contains(&gone));
        assert_eq!(store.iter().count(), 1);
    }

    #[test]
    fn test_shrink_evicts_retiring_entries_first() {
        let mut evicted = Vec::new();
        // retiring = {0, 2}, recent = {3}
        let mut store = filled(3, 0..4);
        assert!(store.remove(&1, &mut sink()));
        assert_eq!(store.len(), 3);

        let resized = store.resize(1, &mut collect(&mut evicted)).unwrap();
        assert_eq!(resized.evicted(), 2);
        evicted.sort();
        assert_eq!(evicted, vec![(0, 0), (2, 2)]);
        assert!(store.contains(&3));
    }

    #[test]
    fn test_shrink_skips_shadowed_copies() {
        let mut evicted = Vec::new();
        // retiring = {0, 1, 2}, recent = {0: 99}
        let mut store = filled(3, 0..3);
        store.set(0, 99, &mut sink());
        assert_eq!(store.len(), 3);

        let resized = store.resize(2, &mut collect(&mut evicted)).unwrap();
        assert_eq!(resized, Resized::Shrank(1));
        assert_eq!(evicted, vec![(1, 1)]);
        assert_eq!(store.peek(&0), Some(&99));
        assert_eq!(store.peek(&2), Some(&2));
    }

    #[test]
    fn test_grow_merges_generations() {
        let mut evicted = Vec::new();
        // retiring = {0, 1, 2}, recent = {3, 0: 50}
        let mut store = filled(3, 0..4);
        store.set(0, 50, &mut sink());
        let total = store.len();

        let resized = store.resize(10, &mut collect(&mut evicted)).unwrap();
        assert_eq!(resized, Resized::Grew);
        assert!(evicted.is_empty());
        assert!(store.retiring.is_empty());
        assert_eq!(store.size, total);
        assert_eq!(store.capacity(), 10);

        // recent's value won.
        assert_eq!(store.peek(&0), Some(&50));
        assert_eq!(store.peek(&1), Some(&1));
        assert_eq!(store.peek(&2), Some(&2));
        assert_eq!(store.peek(&3), Some(&3));
    }

    #[test]
    fn test_equal_resize_evicts_nothing() {
        let mut evicted = Vec::new();
        let mut store = filled(4, 0..4);
        let keys: Vec<u32> = store.iter().map(|(k, _)| *k).collect();

        let resized = store.resize(4, &mut collect(&mut evicted)).unwrap();
        assert_eq!(resized.evicted(), 0);
        assert!(evicted.is_empty());
        for key in keys {
            assert!(store.contains(&key));
        }
    }

    #[test]
    fn test_shrink_then_grow_then_fill() {
        let mut store = filled(2, 1..3);

        assert_eq!(store.resize(1, &mut sink()).unwrap().evicted(), 1);
        assert_eq!(store.resize(2, &mut sink()).unwrap().evicted(), 0);

        store.set(3, 3, &mut sink());
        store.set(4, 4, &mut sink());
        store.set(5, 5, &mut sink());
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_shrink_of_clamped_store_keeps_len_bounded() {
        let mut evicted = Vec::new();
        // 150 live pairs, len clamped to 100.
        let mut store = filled(100, 0..150);
        assert_eq!(store.len(), 100);

        let resized = store.resize(50, &mut collect(&mut evicted)).unwrap();
        assert_eq!(resized.evicted(), 50);
        assert_eq!(evicted.len(), 50);
        assert!(store.len() <= 50);
    }

    #[test]
    fn test_preallocated_grow_to_huge_capacity() {
        let mut store: Generations<u32, u32> = Generations::new(4, true);
        for key in 0..6 {
            store.set(key, key, &mut sink());
        }
        assert_eq!(store.len(), 4);

        let resized = store.resize(usize::MAX / 2, &mut sink()).unwrap();
        assert_eq!(resized, Resized::Grew);
        assert_eq!(store.capacity(), usize::MAX / 2);
        assert_eq!(store.len(), 4);
        assert!(store.retiring.is_empty());
        for key in 0..6 {
            assert_eq!(store.peek(&key), Some(&key));
        }
    }
}
