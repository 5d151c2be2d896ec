//! LRU Tracker Module
//!
//! Implements Least Recently Used tracking for cache eviction.

use std::collections::HashMap;

// == Slot ==
#[derive(Debug)]
struct Slot {
    key: String,
    /// Towards the most recently used end
    prev: Option<usize>,
    /// Towards the least recently used end
    next: Option<usize>,
}

// == LRU Tracker ==
/// Tracks access order for LRU eviction strategy.
///
/// Keys live in a doubly linked list threaded through a slot vector, with a
/// map from key to slot index, so every operation is O(1):
/// - Head = Most recently used
/// - Tail = Least recently used
///
/// Freed slots are recycled through a free list.
#[derive(Debug, Default)]
pub struct LruTracker {
    index: HashMap<String, usize>,
    slots: Vec<Slot>,
    free: Vec<usize>,
    head: Option<usize>,
    tail: Option<usize>,
}

impl LruTracker {
    // == Constructor ==
    /// Creates a new empty LRU tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a tracker with room for `capacity` keys.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            index: HashMap::with_capacity(capacity),
            slots: Vec::with_capacity(capacity),
            ..Self::default()
        }
    }

    // == Touch ==
    /// Marks a key as recently used (moves to head).
    ///
    /// New keys are inserted at the head.
    pub fn touch(&mut self, key: &str) {
        if let Some(&idx) = self.index.get(key) {
            if self.head != Some(idx) {
                self.unlink(idx);
                self.push_front(idx);
            }
            return;
        }

        let slot = Slot {
            key: key.to_string(),
            prev: None,
            next: None,
        };
        let idx = match self.free.pop() {
            Some(idx) => {
                self.slots[idx] = slot;
                idx
            }
            None => {
                self.slots.push(slot);
                self.slots.len() - 1
            }
        };
        self.index.insert(key.to_string(), idx);
        self.push_front(idx);
    }

    // == Remove ==
    /// Removes a key from the tracker. Unknown keys are ignored.
    pub fn remove(&mut self, key: &str) {
        if let Some(idx) = self.index.remove(key) {
            self.unlink(idx);
            self.release(idx);
        }
    }

    // == Evict Oldest ==
    /// Returns and removes the least recently used key.
    ///
    /// Returns None if tracker is empty.
    pub fn evict_oldest(&mut self) -> Option<String> {
        let idx = self.tail?;
        self.unlink(idx);
        let key = std::mem::take(&mut self.slots[idx].key);
        self.index.remove(&key);
        self.free.push(idx);
        Some(key)
    }

    // == Peek Oldest ==
    /// Returns the least recently used key without removing it.
    #[cfg(test)]
    pub fn peek_oldest(&self) -> Option<&str> {
        self.tail.map(|idx| self.slots[idx].key.as_str())
    }

    // == Clear ==
    pub fn clear(&mut self) {
        self.index.clear();
        self.slots.clear();
        self.free.clear();
        self.head = None;
        self.tail = None;
    }

    // == Length ==
    /// Returns the number of tracked keys.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    // == Is Empty ==
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    // == Contains ==
    /// Checks if a key is being tracked.
    #[cfg(test)]
    pub fn contains(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    /// Iterates keys from least to most recently used.
    #[cfg(test)]
    pub fn iter_oldest_first(&self) -> impl Iterator<Item = &str> + '_ {
        let mut cursor = self.tail;
        std::iter::from_fn(move || {
            let idx = cursor?;
            let slot = &self.slots[idx];
            cursor = slot.prev;
            Some(slot.key.as_str())
        })
    }

    // == Linking ==
    fn unlink(&mut self, idx: usize) {
        let (prev, next) = {
            let slot = &self.slots[idx];
            (slot.prev, slot.next)
        };

        match prev {
            Some(p) => self.slots[p].next = next,
            None => self.head = next,
        }
        match next {
            Some(n) => self.slots[n].prev = prev,
            None => self.tail = prev,
        }

        let slot = &mut self.slots[idx];
        slot.prev = None;
        slot.next = None;
    }

    fn push_front(&mut self, idx: usize) {
        self.slots[idx].prev = None;
        self.slots[idx].next = self.head;
        if let Some(old_head) = self.head {
            self.slots[old_head].prev = Some(idx);
        }
        self.head = Some(idx);
        if self.tail.is_none() {
            self.tail = Some(idx);
        }
    }

    fn release(&mut self, idx: usize) {
        self.slots[idx].key.clear();
        self.free.push(idx);
    }
}
