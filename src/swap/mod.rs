//! Swap space: secondary storage for evicted tiles.
//!
//! The cache orchestrator depends on the [`SwapSpace`] contract, not on a
//! concrete store. [`FileSwapSpace`] is the default file-backed
//! implementation; [`NoOpSwapSpace`] discards evictions for callers who
//! want plain drop-on-evict behaviour.

mod file;
mod space;

pub use file::FileSwapSpace;
pub use space::{NoOpSwapSpace, RestoredTile, SwapSpace};
