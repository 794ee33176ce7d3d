//! Memory-bounded raster tile cache with swap-to-disk eviction.
//!
//! `tileswap` keeps decoded raster tiles in memory up to a configurable
//! capacity. When usage exceeds capacity, entries are evicted down to
//! `capacity * threshold` - but instead of being discarded, evicted tiles
//! are handed to a pluggable [`SwapSpace`] and transparently restored on a
//! later lookup. The result is a cache whose misses are bounded by disk
//! reads rather than full recomputation of the tile.
//!
//! # Architecture
//!
//! - [`TileCache`] - the orchestrator: admission, lookup, eviction,
//!   capacity/threshold management, hit/miss accounting, diagnostics
//! - [`SwapSpace`] - the secondary-store contract, with
//!   [`FileSwapSpace`] (one file per tile) and [`NoOpSwapSpace`]
//!   (drop-on-evict) implementations
//! - [`TileAddress`] / [`TileOwner`] - tile identity: an owner plus
//!   column/row indices
//! - [`TilePayload`] / [`TileLayout`] / [`Samples`] - the cached data
//!   model: typed sample buffers with their grid layout
//!
//! Eviction order is least-recently-used by default. Installing a
//! [`PriorityComparator`] switches eviction to ascending comparator order
//! over per-tile [`Priority`] metrics, with recency as the fallback.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use tileswap::{
//!     CacheConfig, NoOpSwapSpace, SampleType, Samples, TileAddress, TileCache, TileLayout,
//!     TilePayload,
//! };
//!
//! # fn main() -> Result<(), tileswap::CacheError> {
//! let cache = TileCache::new(CacheConfig::default(), Arc::new(NoOpSwapSpace::new()))?;
//!
//! let owner = tileswap::OwnerId::unique();
//! let layout = TileLayout {
//!     sample_type: SampleType::F32,
//!     width: 2,
//!     height: 2,
//!     bands: 1,
//!     origin_x: 0,
//!     origin_y: 0,
//!     writable: false,
//! };
//! let payload = TilePayload::new(layout, Samples::F32(vec![0.0; 4]), 0)?;
//!
//! let address = TileAddress::new(owner, 0, 0);
//! cache.add(address, payload);
//! assert!(cache.get(&address).is_some());
//! # Ok(())
//! # }
//! ```

mod address;
mod cache;
mod config;
mod entry;
mod error;
mod events;
mod payload;
mod recency;
mod stats;
mod swap;

pub use address::{OwnerId, TileAddress, TileExtent, TileOwner};
pub use cache::TileCache;
pub use config::{CacheConfig, DEFAULT_CAPACITY, DEFAULT_THRESHOLD};
pub use entry::{Priority, PriorityComparator};
pub use error::CacheError;
pub use events::{CacheEvent, CacheEventKind, CacheListener, RecordingListener};
pub use payload::{SampleType, Samples, TileLayout, TilePayload};
pub use stats::CacheStats;
pub use swap::{FileSwapSpace, NoOpSwapSpace, RestoredTile, SwapSpace};

/// Library version from Cargo metadata.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
