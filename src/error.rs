//! Error types for the hash-lru cache.
//!
//! The cache is total for every lookup and mutation; the only failure mode is
//! asking for a capacity the generational scheme cannot work with.

use thiserror::Error;

/// The main error type for cache operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum CacheError {
    /// A capacity of zero was requested at construction or resize time.
    ///
    /// The cache is left untouched when this is returned.
    #[error("capacity must be a positive integer, got {0}")]
    InvalidCapacity(usize),
}

/// A specialized Result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// Reject a zero capacity.
pub(crate) fn check_capacity(capacity: usize) -> CacheResult<usize> {
    if capacity == 0 {
        tracing::warn!(capacity, "rejected non-positive cache capacity");
        return Err(CacheError::InvalidCapacity(capacity));
    }
    Ok(capacity)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CacheError::InvalidCapacity(0);
        assert_eq!(
            format!("{}", err),
            "capacity must be a positive integer, got 0"
        );
    }

    #[test]
    fn test_check_capacity() {
        assert_eq!(check_capacity(1), Ok(1));
        assert_eq!(check_capacity(0), Err(CacheError::InvalidCapacity(0)));
    }

    #[test]
    fn test_error_is_std_error() {
        fn assert_error<E: std::error::Error + Send + Sync + 'static>(_: &E) {}
        assert_error(&CacheError::InvalidCapacity(0));
    }
}
