//! In-memory cache entry and the opaque priority metric.

use crate::address::TileAddress;
use crate::payload::TilePayload;
use std::any::Any;
use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

/// Opaque, caller-supplied priority metric attached to a tile at admission.
///
/// The cache never interprets the metric itself; an installed
/// [`PriorityComparator`] downcasts it to the caller's concrete type.
pub type Priority = Arc<dyn Any + Send + Sync>;

/// Ordering over optional priority metrics, installed at runtime to switch
/// eviction from recency order to ascending metric order.
///
/// Entries admitted without a metric are passed as `None`; the comparator
/// decides where they rank.
pub type PriorityComparator =
    Arc<dyn Fn(Option<&Priority>, Option<&Priority>) -> Ordering + Send + Sync>;

/// One tile resident in memory.
///
/// Recency links are slot indices owned by the recency list, not stored
/// here, so entries carry no cyclic references.
pub(crate) struct CacheEntry {
    /// Key of this tile
    pub address: TileAddress,
    /// The cached pixel buffer
    pub payload: TilePayload,
    /// Cached payload size, counted toward cache usage
    pub size_bytes: u64,
    /// Monotonically increasing access sequence number
    pub sequence: u64,
    /// Optional priority metric supplied at admission
    pub priority: Option<Priority>,
}

impl CacheEntry {
    pub fn new(
        address: TileAddress,
        payload: TilePayload,
        sequence: u64,
        priority: Option<Priority>,
    ) -> Self {
        let size_bytes = payload.size_bytes();
        Self {
            address,
            payload,
            size_bytes,
            sequence,
            priority,
        }
    }
}

impl fmt::Debug for CacheEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheEntry")
            .field("address", &self.address)
            .field("size_bytes", &self.size_bytes)
            .field("sequence", &self.sequence)
            .field("has_priority", &self.priority.is_some())
            .finish()
    }
}
