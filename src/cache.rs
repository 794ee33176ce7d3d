//! Tile cache orchestrator: admission, dual eviction strategies,
//! capacity/threshold management, and diagnostics.
//!
//! One coarse mutex guards all cache state; every operation, including any
//! swap I/O it triggers, runs inside that critical section. A slow swap
//! store therefore blocks other cache operations on the same instance.

use crate::address::{TileAddress, TileOwner};
use crate::config::CacheConfig;
use crate::entry::{CacheEntry, Priority, PriorityComparator};
use crate::error::CacheError;
use crate::events::{CacheEvent, CacheEventKind, CacheListener};
use crate::payload::TilePayload;
use crate::recency::{RecencyList, SlotId};
use crate::stats::CacheStats;
use crate::swap::{FileSwapSpace, SwapSpace};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

/// Memory-bounded cache for raster tiles that swaps evictions to a
/// secondary store instead of discarding them.
///
/// Tiles are admitted with [`add`](TileCache::add), looked up with
/// [`get`](TileCache::get), and evicted automatically once usage exceeds
/// capacity, down to `capacity * threshold`. Evicted tiles are handed to
/// the configured [`SwapSpace`]; a later `get` for a swapped tile restores
/// and re-admits it transparently.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use tileswap::{CacheConfig, FileSwapSpace, TileCache};
///
/// let swap = Arc::new(FileSwapSpace::new("/tmp/tileswap")?);
/// let cache = TileCache::new(CacheConfig::new(64 * 1024 * 1024), swap)?;
/// # Ok::<(), tileswap::CacheError>(())
/// ```
pub struct TileCache {
    state: Mutex<CacheState>,
    swap: Arc<dyn SwapSpace>,
}

struct CacheState {
    /// Recency ordering; head is most recently touched
    list: RecencyList,
    /// Address index over the same entry set as `list`
    index: HashMap<TileAddress, SlotId>,
    /// Slot ids sorted ascending by the comparator, present iff one is installed
    priority_index: Option<Vec<SlotId>>,
    comparator: Option<PriorityComparator>,
    usage: u64,
    capacity: u64,
    threshold: f64,
    sequence: u64,
    hits: u64,
    misses: u64,
    evictions: u64,
    swap_stores: u64,
    swap_store_failures: u64,
    swap_restores: u64,
    diagnostics: bool,
    listeners: Vec<Arc<dyn CacheListener>>,
}

impl TileCache {
    /// Create a cache with the given configuration and swap space.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::InvalidThreshold`] if the configured threshold
    /// is outside `[0, 1]`.
    pub fn new(config: CacheConfig, swap: Arc<dyn SwapSpace>) -> Result<Self, CacheError> {
        validate_threshold(config.threshold)?;
        Ok(Self {
            state: Mutex::new(CacheState {
                list: RecencyList::new(),
                index: HashMap::new(),
                priority_index: None,
                comparator: None,
                usage: 0,
                capacity: config.capacity_bytes,
                threshold: config.threshold,
                sequence: 0,
                hits: 0,
                misses: 0,
                evictions: 0,
                swap_stores: 0,
                swap_store_failures: 0,
                swap_restores: 0,
                diagnostics: false,
                listeners: Vec::new(),
            }),
            swap,
        })
    }

    /// Create a cache backed by a [`FileSwapSpace`] rooted at `swap_dir`.
    pub fn with_file_swap(
        config: CacheConfig,
        swap_dir: impl Into<PathBuf>,
    ) -> Result<Self, CacheError> {
        let swap = Arc::new(FileSwapSpace::new(swap_dir)?);
        Self::new(config, swap)
    }

    /// Add a tile to the cache.
    ///
    /// If the address is already cached, the existing entry is refreshed
    /// (moved to the most recent position); the payload is not replaced.
    /// A new tile whose size alone exceeds `capacity * threshold` is
    /// rejected and never cached.
    ///
    /// Returns `true` if the tile is (still) cached afterwards.
    pub fn add(&self, address: TileAddress, payload: TilePayload) -> bool {
        self.add_with_priority(address, payload, None)
    }

    /// Add a tile with an associated priority metric.
    ///
    /// The metric participates in priority-order eviction when a comparator
    /// is installed; it is otherwise ignored.
    pub fn add_with_priority(
        &self,
        address: TileAddress,
        payload: TilePayload,
        priority: Option<Priority>,
    ) -> bool {
        let mut state = self.state.lock().unwrap();
        self.add_locked(&mut state, address, payload, priority)
    }

    /// Add a batch of tiles. Applies [`add`](TileCache::add) per item in
    /// one critical section; there is no cross-item atomicity.
    pub fn add_all(&self, items: impl IntoIterator<Item = (TileAddress, TilePayload)>) {
        let mut state = self.state.lock().unwrap();
        for (address, payload) in items {
            self.add_locked(&mut state, address, payload, None);
        }
    }

    /// Retrieve a tile.
    ///
    /// On an in-memory hit the entry is refreshed and its payload returned.
    /// On a miss the swap space is asked to restore the tile; a restored
    /// payload is re-admitted through the add path (which may itself evict,
    /// even the tile just restored, under extreme pressure) and returned
    /// regardless of whether re-admission succeeded.
    pub fn get(&self, address: &TileAddress) -> Option<TilePayload> {
        let mut state = self.state.lock().unwrap();

        if let Some(&id) = state.index.get(address) {
            state.refresh(id);
            state.hits += 1;
            let payload = state.list.entry(id).map(|e| e.payload.clone());
            if let Some(p) = &payload {
                state.emit(CacheEventKind::Updated, address, p.size_bytes());
            }
            return payload;
        }

        match self.swap.restore(address) {
            Some(restored) => {
                state.swap_restores += 1;
                let payload = restored.payload.clone();
                if state.admit(
                    *address,
                    restored.payload,
                    restored.priority,
                    self.swap.as_ref(),
                ) {
                    state.hits += 1;
                }
                Some(payload)
            }
            None => {
                state.misses += 1;
                None
            }
        }
    }

    /// Retrieve a batch of tiles, one `Option` per requested address.
    pub fn get_all(&self, addresses: &[TileAddress]) -> Vec<Option<TilePayload>> {
        addresses.iter().map(|a| self.get(a)).collect()
    }

    /// Whether the address is resident in memory.
    ///
    /// Unlike [`get`](TileCache::get), this never consults the swap space
    /// and never refreshes recency.
    pub fn contains(&self, address: &TileAddress) -> bool {
        self.state.lock().unwrap().index.contains_key(address)
    }

    /// Remove a tile from the cache and delete any swap record for it.
    ///
    /// After `remove`, a `get` for the same address always misses
    /// (assuming the swap deletion succeeded).
    pub fn remove(&self, address: &TileAddress) {
        let mut state = self.state.lock().unwrap();

        if let Some(&id) = state.index.get(address) {
            let size = state.list.entry(id).map(|e| e.size_bytes).unwrap_or(0);
            state.emit(CacheEventKind::AboutToRemove, address, size);

            if let Some(entry) = state.list.remove(id) {
                state.index.remove(address);
                if let Some(pvec) = state.priority_index.as_mut() {
                    pvec.retain(|&s| s != id);
                }
                state.usage -= entry.size_bytes;
                state.emit(CacheEventKind::Removed, address, entry.size_bytes);
            }
        }

        // Unconditional, so a later get cannot resurrect the tile from a
        // stale swap record. Delete failures are logged by the swap space.
        // Still under the lock: a concurrent get must not race the delete.
        self.swap.delete(address);
    }

    /// Remove every tile in the owner's full addressable extent.
    pub fn remove_all(&self, owner: &dyn TileOwner) {
        let owner_id = owner.identity();
        for (x, y) in owner.extent().coords() {
            self.remove(&TileAddress::new(owner_id, x, y));
        }
    }

    /// Remove all resident entries and reset usage and hit/miss counters.
    ///
    /// Swap records already written are left untouched: this is a
    /// memory-only reset, not a logical delete.
    pub fn flush(&self) {
        let mut state = self.state.lock().unwrap();
        if state.list.is_empty() {
            state.sequence = 0;
            state.hits = 0;
            state.misses = 0;
            return;
        }
        let entries = state.list.drain();
        state.index.clear();
        if let Some(pvec) = state.priority_index.as_mut() {
            pvec.clear();
        }
        state.usage = 0;
        state.sequence = 0;
        state.hits = 0;
        state.misses = 0;
        for entry in &entries {
            state.emit(CacheEventKind::RemovedByFlush, &entry.address, entry.size_bytes);
        }
        tracing::debug!(flushed = entries.len(), "cache flushed");
    }

    /// Set the memory capacity in bytes and re-run eviction.
    pub fn set_capacity(&self, capacity_bytes: u64) {
        let mut state = self.state.lock().unwrap();
        state.capacity = capacity_bytes;
        state.evict(self.swap.as_ref());
    }

    /// Current memory capacity in bytes.
    pub fn capacity(&self) -> u64 {
        self.state.lock().unwrap().capacity
    }

    /// Set the eviction threshold and re-run eviction.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::InvalidThreshold`] for values outside `[0, 1]`;
    /// cache state is unchanged on rejection.
    pub fn set_threshold(&self, threshold: f64) -> Result<(), CacheError> {
        validate_threshold(threshold)?;
        let mut state = self.state.lock().unwrap();
        state.threshold = threshold;
        state.evict(self.swap.as_ref());
        Ok(())
    }

    /// Current eviction threshold.
    pub fn threshold(&self) -> f64 {
        self.state.lock().unwrap().threshold
    }

    /// Sum of payload sizes of all resident entries in bytes.
    pub fn usage(&self) -> u64 {
        self.state.lock().unwrap().usage
    }

    /// Number of resident entries.
    pub fn entry_count(&self) -> usize {
        self.state.lock().unwrap().index.len()
    }

    /// Cache hits counted so far.
    pub fn hit_count(&self) -> u64 {
        self.state.lock().unwrap().hits
    }

    /// Cache misses counted so far.
    pub fn miss_count(&self) -> u64 {
        self.state.lock().unwrap().misses
    }

    /// Reset hit and miss counters.
    pub fn reset_counts(&self) {
        let mut state = self.state.lock().unwrap();
        state.hits = 0;
        state.misses = 0;
    }

    /// Install a priority comparator and rebuild the priority index from
    /// the current entry set.
    ///
    /// While a comparator is installed, eviction proceeds in ascending
    /// comparator order instead of recency order. The recency list itself
    /// is unaffected.
    pub fn set_priority_comparator(&self, comparator: PriorityComparator) {
        let mut state = self.state.lock().unwrap();
        state.comparator = Some(comparator);
        state.rebuild_priority_index();
    }

    /// Remove the priority comparator and drop the priority index,
    /// returning eviction to recency order.
    pub fn clear_priority_comparator(&self) {
        let mut state = self.state.lock().unwrap();
        state.comparator = None;
        state.priority_index = None;
    }

    /// Start delivering lifecycle events to registered listeners.
    pub fn enable_diagnostics(&self) {
        self.state.lock().unwrap().diagnostics = true;
    }

    /// Stop delivering lifecycle events.
    pub fn disable_diagnostics(&self) {
        self.state.lock().unwrap().diagnostics = false;
    }

    /// Register a diagnostics listener.
    ///
    /// Listeners are invoked synchronously, inside the cache's critical
    /// section, and only while diagnostics are enabled.
    pub fn add_listener(&self, listener: Arc<dyn CacheListener>) {
        self.state.lock().unwrap().listeners.push(listener);
    }

    /// Snapshot of current counters and accounting.
    pub fn stats(&self) -> CacheStats {
        let state = self.state.lock().unwrap();
        CacheStats {
            usage_bytes: state.usage,
            capacity_bytes: state.capacity,
            threshold: state.threshold,
            entry_count: state.index.len(),
            hits: state.hits,
            misses: state.misses,
            evictions: state.evictions,
            swap_stores: state.swap_stores,
            swap_store_failures: state.swap_store_failures,
            swap_restores: state.swap_restores,
        }
    }

    /// Shared add path for single and batch admission.
    fn add_locked(
        &self,
        state: &mut CacheState,
        address: TileAddress,
        payload: TilePayload,
        priority: Option<Priority>,
    ) -> bool {
        if let Some(&id) = state.index.get(&address) {
            state.refresh(id);
            state.hits += 1;
            let size = state.list.entry(id).map(|e| e.size_bytes).unwrap_or(0);
            state.emit(CacheEventKind::Updated, &address, size);
            return true;
        }
        state.admit(address, payload, priority, self.swap.as_ref())
    }
}

impl CacheState {
    /// Target usage after an eviction pass.
    fn limit(&self) -> u64 {
        (self.capacity as f64 * self.threshold) as u64
    }

    /// Bump the access sequence and move the entry to the recency head.
    fn refresh(&mut self, id: SlotId) {
        self.sequence += 1;
        let sequence = self.sequence;
        if let Some(entry) = self.list.entry_mut(id) {
            entry.sequence = sequence;
        }
        self.list.move_to_head(id);
    }

    /// Admit a new entry, then run eviction if usage exceeds capacity.
    fn admit(
        &mut self,
        address: TileAddress,
        payload: TilePayload,
        priority: Option<Priority>,
        swap: &dyn SwapSpace,
    ) -> bool {
        let size = payload.size_bytes();
        if size > self.limit() {
            // Caching it would only provoke an eviction pass that ends up
            // removing the tile again; the caller uses it transiently.
            tracing::debug!(%address, size, limit = self.limit(), "tile exceeds eviction target, not cached");
            return false;
        }

        self.sequence += 1;
        let entry = CacheEntry::new(address, payload, self.sequence, priority);
        let id = self.list.push_head(entry);
        self.index.insert(address, id);
        self.insert_into_priority_index(id);
        self.usage += size;
        self.emit(CacheEventKind::Added, &address, size);

        if self.usage > self.capacity {
            self.evict(swap);
        }
        true
    }

    /// Evict entries until usage drops to `capacity * threshold`.
    ///
    /// Uses ascending comparator order while a priority index is present,
    /// then falls back to recency order (least recently touched first) for
    /// any remainder.
    fn evict(&mut self, swap: &dyn SwapSpace) {
        let limit = self.limit();
        if self.usage <= limit {
            return;
        }
        let (usage_before, count_before) = (self.usage, self.list.len());

        if self.priority_index.is_some() {
            self.evict_by_priority(limit, swap);
        }
        while self.usage > limit {
            match self.list.tail() {
                Some(tail) => {
                    self.evict_slot(tail, swap);
                }
                None => break,
            }
        }

        tracing::debug!(
            evicted = count_before - self.list.len(),
            freed_bytes = usage_before - self.usage,
            usage = self.usage,
            limit,
            "eviction pass complete"
        );
    }

    /// Evict in ascending comparator order from the priority index.
    fn evict_by_priority(&mut self, limit: u64, swap: &dyn SwapSpace) {
        while self.usage > limit {
            let id = {
                let pvec = match self.priority_index.as_mut() {
                    Some(pvec) => pvec,
                    None => return,
                };
                if pvec.is_empty() {
                    break;
                }
                pvec.remove(0)
            };

            if self.list.entry(id).is_none() {
                // Stale slot in the priority structure; the recency
                // fallback will finish the pass.
                tracing::error!(slot = id, "stale entry in priority index during eviction");
                continue;
            }
            self.evict_slot(id, swap);
        }
    }

    /// Hand one entry to the swap space and drop it from memory.
    ///
    /// The entry is removed and usage decremented regardless of the store
    /// outcome: a failed store loses that tile's content, not the pass.
    fn evict_slot(&mut self, id: SlotId, swap: &dyn SwapSpace) -> bool {
        let entry = match self.list.remove(id) {
            Some(entry) => entry,
            None => return false,
        };
        self.index.remove(&entry.address);
        if let Some(pvec) = self.priority_index.as_mut() {
            pvec.retain(|&s| s != id);
        }

        if swap.store(&entry.address, &entry.payload, entry.priority.as_ref()) {
            self.swap_stores += 1;
        } else {
            self.swap_store_failures += 1;
            tracing::warn!(
                address = %entry.address,
                size = entry.size_bytes,
                "swap store failed during eviction, tile content lost"
            );
        }

        self.usage -= entry.size_bytes;
        self.evictions += 1;
        self.emit(
            CacheEventKind::RemovedByEviction,
            &entry.address,
            entry.size_bytes,
        );
        true
    }

    /// Insert a slot into the priority index at its sorted position.
    /// No-op when no comparator is installed.
    fn insert_into_priority_index(&mut self, id: SlotId) {
        let list = &self.list;
        let priority = list.entry(id).and_then(|e| e.priority.as_ref());
        let (cmp, pvec) = match (self.comparator.as_ref(), self.priority_index.as_mut()) {
            (Some(cmp), Some(pvec)) => (cmp, pvec),
            _ => return,
        };

        let pos = pvec.partition_point(|&sid| {
            let existing = list.entry(sid).and_then(|e| e.priority.as_ref());
            cmp(existing, priority) != Ordering::Greater
        });
        pvec.insert(pos, id);
    }

    /// Rebuild the priority index in full from the current entry set.
    fn rebuild_priority_index(&mut self) {
        let cmp = match self.comparator.as_ref() {
            Some(cmp) => cmp,
            None => {
                self.priority_index = None;
                return;
            }
        };
        let list = &self.list;
        let mut ids: Vec<SlotId> = list.iter().map(|(id, _)| id).collect();
        ids.sort_by(|&a, &b| {
            let pa = list.entry(a).and_then(|e| e.priority.as_ref());
            let pb = list.entry(b).and_then(|e| e.priority.as_ref());
            cmp(pa, pb)
        });
        self.priority_index = Some(ids);
    }

    /// Deliver one event to all listeners, if diagnostics are enabled.
    fn emit(&self, kind: CacheEventKind, address: &TileAddress, size_bytes: u64) {
        if !self.diagnostics || self.listeners.is_empty() {
            return;
        }
        let event = CacheEvent {
            kind,
            address: *address,
            size_bytes,
        };
        for listener in &self.listeners {
            listener.on_event(&event);
        }
    }
}

fn validate_threshold(value: f64) -> Result<(), CacheError> {
    if !(0.0..=1.0).contains(&value) {
        return Err(CacheError::InvalidThreshold { value });
    }
    Ok(())
}
