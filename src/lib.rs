//! # Hash LRU
//!
//! A thread-safe, bounded cache for Rust that approximates least-recently-used
//! eviction with two rotating hash map generations.
//!
//! ## Features
//!
//! - **O(1) operations**: no access-order list to maintain; amortized constant
//!   time for `set`, `get`, `peek`, `contains` and `remove`
//! - **Thread-safe**: Share across threads with `Clone` (uses `Arc` internally)
//! - **Eviction callback**: get told about every entry the cache drops
//! - **Runtime resize**: grow or shrink the capacity under live traffic
//! - **Statistics**: Track hits, misses, evictions and rotations
//! - **Zero unsafe code**: Built entirely with safe Rust
//!
//! ## How it works
//!
//! Writes land in a *recent* generation. Once `capacity` distinct keys have
//! been written, the *retiring* generation is thrown away as a whole and
//! *recent* becomes the new *retiring*. Reading a key that lives in
//! *retiring* copies it back into *recent*, so anything touched at least once
//! per generation survives. Eviction is therefore bulk and approximate:
//! `len()` is an estimate bounded by the capacity, and the eviction callback
//! fires a whole generation at a time.
//!
//! ## Quick Start
//!
//! ```rust
//! use hash_lru::{CacheConfig, HashLru};
//!
//! let config = CacheConfig::new().max_capacity(10_000);
//! let cache = HashLru::from_config(config).unwrap();
//!
//! cache.set("user:123", "Alice");
//!
//! if let Some(value) = cache.get("user:123") {
//!     println!("Found: {:?}", value);
//! }
//!
//! // Shrink at runtime; the oldest entries go first.
//! let evicted = cache.resize(1_000).unwrap();
//! assert_eq!(evicted, 0);
//!
//! let stats = cache.stats();
//! println!("Hit rate: {:.1}%", stats.hit_rate);
//! ```
//!
//! ## Thread Safety
//!
//! The cache is safe to share across threads. Cloning a `HashLru` creates a
//! new handle to the same underlying data:
//!
//! ```rust
//! use hash_lru::HashLru;
//! use std::thread;
//!
//! let cache = HashLru::new(1024).unwrap();
//!
//! let handles: Vec<_> = (0..4).map(|i| {
//!     let cache = cache.clone();
//!     thread::spawn(move || {
//!         cache.set(format!("key_{}", i), format!("value_{}", i));
//!     })
//! }).collect();
//!
//! for handle in handles {
//!     handle.join().unwrap();
//! }
//! assert_eq!(cache.len(), 4);
//! ```
//!
//! Lookups and `len()` share a read lock. Everything that can insert, promote
//! or evict takes the write lock, and the eviction callback runs while it is
//! held: never call back into the cache from inside the callback.

pub mod cache;
pub mod config;
pub mod error;
pub mod stats;

pub use cache::HashLru;
pub use config::{CacheConfig, DEFAULT_CAPACITY};
pub use error::{CacheError, CacheResult};
pub use stats::{CacheStats, StatsSnapshot};

// Internal modules - not part of public API
pub(crate) mod generation;
pub(crate) mod resize;
pub(crate) mod storage;
