//! Cache configuration.

/// Default memory capacity of the cache (16 MiB).
pub const DEFAULT_CAPACITY: u64 = 16 * 1024 * 1024;

/// Default eviction threshold: fraction of capacity retained after eviction.
pub const DEFAULT_THRESHOLD: f64 = 0.75;

/// Tile cache configuration.
///
/// The swap directory is deliberately not part of this struct: a swap space
/// is constructed explicitly and handed to the cache, so there is no ambient
/// process-wide default location.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Maximum memory usage in bytes
    pub capacity_bytes: u64,
    /// Target fraction of capacity to retain after an eviction pass, in [0, 1]
    pub threshold: f64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity_bytes: DEFAULT_CAPACITY,
            threshold: DEFAULT_THRESHOLD,
        }
    }
}

impl CacheConfig {
    /// Create a configuration with the given capacity and default threshold.
    pub fn new(capacity_bytes: u64) -> Self {
        Self {
            capacity_bytes,
            ..Self::default()
        }
    }

    /// Set the memory capacity in bytes.
    pub fn with_capacity(mut self, capacity_bytes: u64) -> Self {
        self.capacity_bytes = capacity_bytes;
        self
    }

    /// Set the eviction threshold.
    ///
    /// Validated when the cache is constructed.
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }
}
