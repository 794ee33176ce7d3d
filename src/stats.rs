//! Cache statistics snapshots for monitoring and debugging.

/// Point-in-time snapshot of cache counters and accounting.
#[derive(Debug, Clone, Default)]
pub struct CacheStats {
    /// Sum of payload sizes of all resident entries
    pub usage_bytes: u64,
    /// Configured memory capacity
    pub capacity_bytes: u64,
    /// Configured eviction threshold
    pub threshold: f64,
    /// Number of resident entries
    pub entry_count: usize,
    /// Cache hits (index hits on `add` refresh and `get`)
    pub hits: u64,
    /// Cache misses (both index and swap space missed)
    pub misses: u64,
    /// Entries evicted by memory control
    pub evictions: u64,
    /// Successful swap stores
    pub swap_stores: u64,
    /// Failed swap stores (tile content lost)
    pub swap_store_failures: u64,
    /// Successful swap restores
    pub swap_restores: u64,
}

impl CacheStats {
    /// Hit rate over all counted lookups (0.0 to 1.0).
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    /// Fraction of capacity currently in use (0.0 to 1.0).
    pub fn fill_ratio(&self) -> f64 {
        if self.capacity_bytes == 0 {
            0.0
        } else {
            self.usage_bytes as f64 / self.capacity_bytes as f64
        }
    }
}
