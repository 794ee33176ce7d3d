//! Diagnostics lifecycle events and the synchronous listener contract.
//!
//! When diagnostics are enabled, the cache delivers one event synchronously,
//! immediately after the corresponding mutation, to every registered
//! listener. Listeners run inside the cache's critical section and must
//! not call back into the cache.

use crate::address::TileAddress;
use std::sync::{Arc, Mutex};

/// What happened to a cache entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheEventKind {
    /// Entry was admitted into the cache
    Added,
    /// Existing entry was refreshed by an `add` or `get` hit
    Updated,
    /// Entry was removed explicitly
    Removed,
    /// Entry was removed by `flush`
    RemovedByFlush,
    /// Entry was evicted by memory control
    RemovedByEviction,
    /// Entry is about to be removed explicitly
    AboutToRemove,
}

/// A single diagnostics event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheEvent {
    /// Kind of lifecycle transition
    pub kind: CacheEventKind,
    /// Address of the affected tile
    pub address: TileAddress,
    /// Payload size of the affected tile in bytes
    pub size_bytes: u64,
}

/// Receiver of diagnostics events.
pub trait CacheListener: Send + Sync {
    /// Called synchronously after each mutation while diagnostics are enabled.
    fn on_event(&self, event: &CacheEvent);
}

/// Listener that records every event it sees, for tests and ad-hoc telemetry.
#[derive(Default)]
pub struct RecordingListener {
    events: Mutex<Vec<CacheEvent>>,
}

impl RecordingListener {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Snapshot of all recorded events, in delivery order.
    pub fn events(&self) -> Vec<CacheEvent> {
        self.events.lock().unwrap().clone()
    }

    /// Addresses of recorded events matching `kind`, in delivery order.
    pub fn addresses_of(&self, kind: CacheEventKind) -> Vec<TileAddress> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.kind == kind)
            .map(|e| e.address)
            .collect()
    }
}

impl CacheListener for RecordingListener {
    fn on_event(&self, event: &CacheEvent) {
        self.events.lock().unwrap().push(*event);
    }
}
