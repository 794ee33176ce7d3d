//! Slab-backed recency ordering over cache entries.
//!
//! A doubly linked list threaded through a slot vector with index links,
//! giving O(1) insert-at-head, move-to-head, and removal by slot id without
//! raw cyclic references. Head is the most recently touched entry, tail the
//! least recently touched.

use crate::entry::CacheEntry;

/// Stable handle to an entry's slot for the lifetime of the entry.
pub(crate) type SlotId = usize;

struct Slot {
    entry: CacheEntry,
    prev: Option<SlotId>,
    next: Option<SlotId>,
}

/// Doubly linked recency list over a slot vector.
///
/// Freed slots are recycled through a free list, so slot ids stay compact
/// under steady-state churn.
pub(crate) struct RecencyList {
    slots: Vec<Option<Slot>>,
    free: Vec<SlotId>,
    head: Option<SlotId>,
    tail: Option<SlotId>,
    len: usize,
}

impl RecencyList {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            head: None,
            tail: None,
            len: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Slot id of the least recently touched entry.
    pub fn tail(&self) -> Option<SlotId> {
        self.tail
    }

    /// Slot id of the most recently touched entry.
    #[cfg(test)]
    pub fn head(&self) -> Option<SlotId> {
        self.head
    }

    /// Entry stored in `id`, if the slot is live.
    pub fn entry(&self, id: SlotId) -> Option<&CacheEntry> {
        self.slots.get(id)?.as_ref().map(|slot| &slot.entry)
    }

    /// Mutable entry stored in `id`, if the slot is live.
    pub fn entry_mut(&mut self, id: SlotId) -> Option<&mut CacheEntry> {
        self.slots.get_mut(id)?.as_mut().map(|slot| &mut slot.entry)
    }

    /// Insert an entry at the head (most recent position).
    pub fn push_head(&mut self, entry: CacheEntry) -> SlotId {
        let slot = Slot {
            entry,
            prev: None,
            next: self.head,
        };

        let id = match self.free.pop() {
            Some(id) => {
                self.slots[id] = Some(slot);
                id
            }
            None => {
                self.slots.push(Some(slot));
                self.slots.len() - 1
            }
        };

        match self.head {
            Some(old_head) => {
                if let Some(s) = self.slots[old_head].as_mut() {
                    s.prev = Some(id);
                }
            }
            None => self.tail = Some(id),
        }
        self.head = Some(id);
        self.len += 1;
        id
    }

    /// Move a live slot to the head. No-op if `id` is stale or already head.
    pub fn move_to_head(&mut self, id: SlotId) {
        if self.head == Some(id) || self.entry(id).is_none() {
            return;
        }
        self.unlink(id);

        let old_head = self.head;
        if let Some(slot) = self.slots[id].as_mut() {
            slot.prev = None;
            slot.next = old_head;
        }
        if let Some(h) = old_head {
            if let Some(slot) = self.slots[h].as_mut() {
                slot.prev = Some(id);
            }
        } else {
            self.tail = Some(id);
        }
        self.head = Some(id);
    }

    /// Remove a slot and return its entry. Returns `None` for stale ids.
    pub fn remove(&mut self, id: SlotId) -> Option<CacheEntry> {
        self.entry(id)?;
        self.unlink(id);
        let slot = self.slots[id].take()?;
        self.free.push(id);
        self.len -= 1;
        Some(slot.entry)
    }

    /// Drain all entries in recency order (most recent first) and reset.
    pub fn drain(&mut self) -> Vec<CacheEntry> {
        let mut entries = Vec::with_capacity(self.len);
        let mut cursor = self.head;
        while let Some(id) = cursor {
            let slot = match self.slots[id].take() {
                Some(slot) => slot,
                None => break,
            };
            cursor = slot.next;
            entries.push(slot.entry);
        }
        self.slots.clear();
        self.free.clear();
        self.head = None;
        self.tail = None;
        self.len = 0;
        entries
    }

    /// Iterate all live slots in storage order.
    pub fn iter(&self) -> impl Iterator<Item = (SlotId, &CacheEntry)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(id, slot)| slot.as_ref().map(|s| (id, &s.entry)))
    }

    /// Detach `id` from its neighbours, fixing head/tail pointers.
    /// The slot itself stays allocated.
    fn unlink(&mut self, id: SlotId) {
        let (prev, next) = match self.slots.get(id).and_then(|s| s.as_ref()) {
            Some(slot) => (slot.prev, slot.next),
            None => return,
        };

        match prev {
            Some(p) => {
                if let Some(slot) = self.slots[p].as_mut() {
                    slot.next = next;
                }
            }
            None => self.head = next,
        }
        match next {
            Some(n) => {
                if let Some(slot) = self.slots[n].as_mut() {
                    slot.prev = prev;
                }
            }
            None => self.tail = prev,
        }
    }
}
