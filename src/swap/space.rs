//! Swap space contract.

use crate::address::TileAddress;
use crate::entry::Priority;
use crate::payload::TilePayload;

/// A tile reconstructed from swap storage.
pub struct RestoredTile {
    /// Payload with layout, offset, and mutability exactly as persisted
    pub payload: TilePayload,
    /// Priority metric the tile carried when it was stored
    pub priority: Option<Priority>,
}

/// Secondary store for evicted tiles.
///
/// The cache invokes a swap space from inside its own critical section, so
/// implementations must synchronize their internal state independently and
/// remain safe when called from multiple cache instances' threads.
///
/// All operations report failure through their return value; they must not
/// panic on I/O errors.
pub trait SwapSpace: Send + Sync {
    /// Persist a tile so it can be reconstructed later.
    ///
    /// Must be idempotent: storing the same unchanged tile twice must not
    /// corrupt state. Implementations may skip re-writing when an existing
    /// record's declared size matches the payload's expected serialized
    /// size, provided the payload is immutable.
    fn store(
        &self,
        address: &TileAddress,
        payload: &TilePayload,
        priority: Option<&Priority>,
    ) -> bool;

    /// Reconstruct a previously stored tile, or `None` if no record exists
    /// or the stored data cannot be read back.
    fn restore(&self, address: &TileAddress) -> Option<RestoredTile>;

    /// Delete any record for `address`. Idempotent; returns `true` when no
    /// record remains afterwards.
    fn delete(&self, address: &TileAddress) -> bool;
}

/// Swap space that never stores anything.
///
/// Evicted tiles are simply discarded, turning the cache into a plain
/// bounded LRU. Useful for tests and for pipelines whose tiles are cheap
/// to recompute.
#[derive(Debug, Clone, Default)]
pub struct NoOpSwapSpace;

impl NoOpSwapSpace {
    pub fn new() -> Self {
        Self
    }
}

impl SwapSpace for NoOpSwapSpace {
    fn store(
        &self,
        _address: &TileAddress,
        _payload: &TilePayload,
        _priority: Option<&Priority>,
    ) -> bool {
        true // accept but don't persist
    }

    fn restore(&self, _address: &TileAddress) -> Option<RestoredTile> {
        None // always miss
    }

    fn delete(&self, _address: &TileAddress) -> bool {
        true // nothing to delete
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::OwnerId;
    use crate::payload::{SampleType, Samples, TileLayout};

    fn test_payload() -> TilePayload {
        TilePayload::new(
            TileLayout {
                sample_type: SampleType::U8,
                width: 2,
                height: 2,
                bands: 1,
                origin_x: 0,
                origin_y: 0,
                writable: false,
            },
            Samples::U8(vec![1, 2, 3, 4]),
            0,
        )
        .unwrap()
    }

    #[test]
    fn test_noop_swap_accepts_but_never_restores() {
        let swap = NoOpSwapSpace::new();
        let address = TileAddress::new(OwnerId::from_raw(1), 0, 0);

        assert!(swap.store(&address, &test_payload(), None));
        assert!(swap.restore(&address).is_none());
    }

    #[test]
    fn test_noop_swap_delete_is_idempotent() {
        let swap = NoOpSwapSpace::new();
        let address = TileAddress::new(OwnerId::from_raw(1), 0, 0);

        assert!(swap.delete(&address));
        assert!(swap.delete(&address));
    }

    #[test]
    fn test_noop_swap_as_trait_object() {
        let swap: Box<dyn SwapSpace> = Box::new(NoOpSwapSpace::new());
        let address = TileAddress::new(OwnerId::from_raw(1), 0, 0);
        assert!(swap.restore(&address).is_none());
    }
}
