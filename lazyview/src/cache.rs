use alloc::vec::Vec;

use crate::key::{KeyMap, ViewportKey};
use crate::{CacheStats, ViewportError};

const NIL: usize = usize::MAX;

#[derive(Clone, Debug)]
struct Slot<K, V> {
    key: K,
    value: V,
    prev: usize, // towards MRU
    next: usize, // towards LRU
    pinned: bool,
}

/// A bounded least-recently-used map with hit/miss/eviction counters.
///
/// Entries live in a slot arena threaded by an intrusive doubly linked list (head = most
/// recently used, tail = least recently used), so lookups, promotions and evictions never
/// shift other entries.
///
/// Pinned entries are skipped by eviction. The viewport pins identities whose lazy load is in
/// flight.
#[derive(Clone, Debug)]
pub struct LruCache<K, V> {
    slots: Vec<Option<Slot<K, V>>>,
    free: Vec<usize>,
    lookup: KeyMap<K, usize>,
    head: usize,
    tail: usize,
    capacity: usize,
    hits: u64,
    misses: u64,
    evictions: u64,
}

impl<K: ViewportKey, V> LruCache<K, V> {
    /// Creates an empty cache. `capacity` is fixed for the cache's lifetime and must be non-zero.
    pub fn new(capacity: usize) -> Result<Self, ViewportError> {
        if capacity == 0 {
            return Err(ViewportError::ZeroCacheCapacity);
        }
        Ok(Self {
            slots: Vec::new(),
            free: Vec::new(),
            lookup: KeyMap::new(),
            head: NIL,
            tail: NIL,
            capacity,
            hits: 0,
            misses: 0,
            evictions: 0,
        })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.lookup.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lookup.is_empty()
    }

    pub fn contains(&self, key: &K) -> bool {
        self.lookup.contains_key(key)
    }

    /// Looks up `key`, recording a hit (and promoting the entry) or a miss.
    pub fn get(&mut self, key: &K) -> Option<&V> {
        let Some(&idx) = self.lookup.get(key) else {
            self.misses = self.misses.saturating_add(1);
            return None;
        };
        self.hits = self.hits.saturating_add(1);
        self.move_to_front(idx);
        self.slots[idx].as_ref().map(|s| &s.value)
    }

    /// Looks up `key` without touching recency or counters.
    pub fn peek(&self, key: &K) -> Option<&V> {
        let &idx = self.lookup.get(key)?;
        self.slots[idx].as_ref().map(|s| &s.value)
    }

    /// Inserts or replaces `key` at the most-recently-used position, then evicts unpinned
    /// entries from the least-recently-used end until the cache is back within capacity.
    ///
    /// Returns the previous value for `key`, if any.
    pub fn put(&mut self, key: K, value: V) -> Option<V> {
        if let Some(&idx) = self.lookup.get(&key) {
            self.move_to_front(idx);
            let slot = self.slots[idx].as_mut()?;
            return Some(core::mem::replace(&mut slot.value, value));
        }

        let slot = Slot {
            key: key.clone(),
            value,
            prev: NIL,
            next: NIL,
            pinned: false,
        };
        let idx = if let Some(idx) = self.free.pop() {
            self.slots[idx] = Some(slot);
            idx
        } else {
            self.slots.push(Some(slot));
            self.slots.len() - 1
        };
        self.lookup.insert(key, idx);
        self.link_front(idx);
        self.evict_overflow();
        None
    }

    pub fn remove(&mut self, key: &K) -> Option<V> {
        let idx = self.lookup.remove(key)?;
        self.unlink(idx);
        let slot = self.slots[idx].take()?;
        self.free.push(idx);
        Some(slot.value)
    }

    /// Protects an entry from eviction. Returns `false` if `key` is not cached.
    pub fn pin(&mut self, key: &K) -> bool {
        self.set_pinned(key, true)
    }

    /// Makes a pinned entry evictable again, shrinking back to capacity if needed.
    pub fn unpin(&mut self, key: &K) -> bool {
        let found = self.set_pinned(key, false);
        if found {
            self.evict_overflow();
        }
        found
    }

    pub fn is_pinned(&self, key: &K) -> bool {
        self.lookup
            .get(key)
            .and_then(|&idx| self.slots[idx].as_ref())
            .is_some_and(|s| s.pinned)
    }

    /// Drops every entry. Counters are kept; see [`Self::reset_stats`].
    pub fn clear(&mut self) {
        self.slots.clear();
        self.free.clear();
        self.lookup.clear();
        self.head = NIL;
        self.tail = NIL;
    }

    pub fn reset_stats(&mut self) {
        self.hits = 0;
        self.misses = 0;
        self.evictions = 0;
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits,
            misses: self.misses,
            evictions: self.evictions,
            size: self.len(),
            capacity: self.capacity,
        }
    }

    /// Iterates keys from most to least recently used.
    pub fn keys(&self) -> impl Iterator<Item = &K> + '_ {
        let mut cur = self.head;
        core::iter::from_fn(move || {
            let slot = self.slots.get(cur)?.as_ref()?;
            cur = slot.next;
            Some(&slot.key)
        })
    }

    fn set_pinned(&mut self, key: &K, pinned: bool) -> bool {
        let Some(&idx) = self.lookup.get(key) else {
            return false;
        };
        match self.slots[idx].as_mut() {
            Some(slot) => {
                slot.pinned = pinned;
                true
            }
            None => false,
        }
    }

    fn evict_overflow(&mut self) {
        let mut cur = self.tail;
        while self.len() > self.capacity && cur != NIL {
            let Some(slot) = self.slots[cur].as_ref() else {
                break;
            };
            let prev = slot.prev;
            if !slot.pinned {
                let key = slot.key.clone();
                self.lookup.remove(&key);
                self.unlink(cur);
                self.slots[cur] = None;
                self.free.push(cur);
                self.evictions = self.evictions.saturating_add(1);
            }
            cur = prev;
        }
        if self.len() > self.capacity {
            vwarn!(
                size = self.len(),
                capacity = self.capacity,
                "LruCache: every entry is pinned, cannot shrink"
            );
        }
    }

    fn move_to_front(&mut self, idx: usize) {
        if self.head == idx {
            return;
        }
        self.unlink(idx);
        self.link_front(idx);
    }

    fn link_front(&mut self, idx: usize) {
        let old_head = self.head;
        if let Some(slot) = self.slots[idx].as_mut() {
            slot.prev = NIL;
            slot.next = old_head;
        }
        if old_head != NIL {
            if let Some(head) = self.slots[old_head].as_mut() {
                head.prev = idx;
            }
        } else {
            self.tail = idx;
        }
        self.head = idx;
    }

    fn unlink(&mut self, idx: usize) {
        let Some((prev, next)) = self.slots[idx].as_ref().map(|s| (s.prev, s.next)) else {
            return;
        };
        if prev != NIL {
            if let Some(p) = self.slots[prev].as_mut() {
                p.next = next;
            }
        } else {
            self.head = next;
        }
        if next != NIL {
            if let Some(n) = self.slots[next].as_mut() {
                n.prev = prev;
            }
        } else {
            self.tail = prev;
        }
        if let Some(slot) = self.slots[idx].as_mut() {
            slot.prev = NIL;
            slot.next = NIL;
        }
    }
}
