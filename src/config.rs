//! Configuration for the hash-lru cache.
//!
//! This module provides a builder for the capacity bound and the allocation
//! behavior of the two generations.

use crate::error::{check_capacity, CacheResult};

/// Capacity used by [`CacheConfig::default`] and `HashLru::default`.
pub const DEFAULT_CAPACITY: usize = 1024;

/// Configuration for creating a new cache instance.
///
/// Use the builder pattern to construct configuration:
///
/// ```
/// use hash_lru::CacheConfig;
///
/// let config = CacheConfig::new()
///     .max_capacity(10_000)
///     .preallocate(true)
///     .build()
///     .unwrap();
///
/// assert_eq!(config.get_max_capacity(), 10_000);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// Number of distinct keys a generation may receive before it rotates.
    /// This is also the upper bound reported by `len()`.
    pub(crate) max_capacity: usize,

    /// Reserve `max_capacity` slots in each generation up front.
    pub(crate) preallocate: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_capacity: DEFAULT_CAPACITY,
            preallocate: false,
        }
    }
}

impl CacheConfig {
    /// Create a new configuration builder with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum capacity of the cache.
    ///
    /// Zero is accepted here and rejected by [`build`](Self::build).
    pub fn max_capacity(mut self, capacity: usize) -> Self {
        self.max_capacity = capacity;
        self
    }

    /// Reserve room for `max_capacity` entries in both generations whenever
    /// they are created, so inserts never grow the underlying tables.
    ///
    /// Worth it for large, steadily full caches; wasteful for caches that
    /// rarely fill. A reservation the allocator cannot satisfy is skipped
    /// with a warning and the generation grows on demand instead.
    pub fn preallocate(mut self, enabled: bool) -> Self {
        self.preallocate = enabled;
        self
    }

    /// Validate and return the final configuration.
    ///
    /// # Errors
    /// [`CacheError::InvalidCapacity`](crate::CacheError::InvalidCapacity)
    /// if the capacity is zero.
    pub fn build(self) -> CacheResult<Self> {
        check_capacity(self.max_capacity)?;
        Ok(self)
    }

    /// Get the maximum capacity.
    pub fn get_max_capacity(&self) -> usize {
        self.max_capacity
    }

    /// Whether generations are preallocated.
    pub fn is_preallocated(&self) -> bool {
        self.preallocate
    }
}
