//! Tile addressing: owner identities, tile coordinates, and extents.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Counter backing [`OwnerId::unique`]. Starts at 1 so 0 stays available
/// as a sentinel for callers that map their own identities.
static NEXT_OWNER_ID: AtomicU64 = AtomicU64::new(1);

/// Stable identity of a tile producer.
///
/// An owner identity must remain stable for the lifetime of the owning
/// object and must not collide across distinct owners. Use [`OwnerId::unique`]
/// to draw a fresh process-unique identity, or [`OwnerId::from_raw`] when the
/// owning pipeline already has a stable identifier of its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OwnerId(u64);

impl OwnerId {
    /// Draw a fresh identity that is unique within this process.
    pub fn unique() -> Self {
        Self(NEXT_OWNER_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Wrap an externally managed identity.
    ///
    /// The caller is responsible for collision freedom across owners.
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw identity value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// Key uniquely identifying a tile: owner identity plus tile coordinates.
///
/// Immutable once constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileAddress {
    /// Identity of the producing owner
    pub owner: OwnerId,
    /// Tile X index within the owner's grid
    pub x: i32,
    /// Tile Y index within the owner's grid
    pub y: i32,
}

impl TileAddress {
    /// Create a new tile address.
    pub fn new(owner: OwnerId, x: i32, y: i32) -> Self {
        Self { owner, x, y }
    }
}

impl fmt::Display for TileAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.owner, self.x, self.y)
    }
}

/// Rectangular tile-coordinate extent of an owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileExtent {
    /// Minimum tile X index
    pub min_x: i32,
    /// Minimum tile Y index
    pub min_y: i32,
    /// Number of tile columns
    pub width: u32,
    /// Number of tile rows
    pub height: u32,
}

impl TileExtent {
    /// Create a new extent.
    pub fn new(min_x: i32, min_y: i32, width: u32, height: u32) -> Self {
        Self {
            min_x,
            min_y,
            width,
            height,
        }
    }

    /// Iterate over all `(x, y)` tile coordinates in this extent,
    /// row-major from the minimum corner.
    pub fn coords(&self) -> impl Iterator<Item = (i32, i32)> + '_ {
        let (min_x, min_y) = (self.min_x, self.min_y);
        let width = self.width as i32;
        (0..self.height as i32)
            .flat_map(move |dy| (0..width).map(move |dx| (min_x + dx, min_y + dy)))
    }

    /// Total number of tiles in the extent.
    pub fn tile_count(&self) -> u64 {
        self.width as u64 * self.height as u64
    }
}

/// Contract the owning pipeline implements so the cache can address
/// and enumerate its tiles.
///
/// The cache never inspects pixel semantics; it only needs a stable
/// identity and, for bulk removal, the full addressable extent.
pub trait TileOwner {
    /// Stable identity of this owner.
    fn identity(&self) -> OwnerId;

    /// Full addressable tile extent of this owner.
    fn extent(&self) -> TileExtent;
}
