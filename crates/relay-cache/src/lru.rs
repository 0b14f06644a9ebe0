//! Fixed-capacity cache with least-recently-used eviction
//!
//! A hash map indexes into a slab of entries threaded onto an intrusive
//! doubly-linked recency list, so lookup, promotion-to-most-recent, and
//! eviction-of-least-recent are all O(1). `len() <= capacity` holds after
//! every operation; `set` enforces it by evicting the least-recently-used
//! entry before inserting a new key at capacity.

use std::collections::HashMap;
use std::hash::Hash;

/// Sentinel index for "no entry"
const NIL: usize = usize::MAX;

#[derive(Debug)]
struct Entry<K, V> {
    key: K,
    value: V,
    prev: usize,
    next: usize,
}

/// Fixed-capacity, recency-ordered associative cache
#[derive(Debug)]
pub struct BoundedCache<K, V> {
    capacity: usize,
    map: HashMap<K, usize>,
    slab: Vec<Option<Entry<K, V>>>,
    free: Vec<usize>,
    /// Least recently used
    head: usize,
    /// Most recently used
    tail: usize,
}

impl<K, V> BoundedCache<K, V>
where
    K: Eq + Hash + Clone,
{
    /// Create a cache holding at most `capacity` entries
    ///
    /// # Panics
    /// Panics if `capacity` is zero.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "cache capacity must be > 0");
        Self {
            capacity,
            map: HashMap::with_capacity(capacity),
            slab: Vec::with_capacity(capacity),
            free: Vec::new(),
            head: NIL,
            tail: NIL,
        }
    }

    /// Get the configured capacity
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Get the number of cached entries
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Check if the cache is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Look up a value, marking it most-recently-used on a hit
    pub fn get(&mut self, key: &K) -> Option<&V> {
        let idx = *self.map.get(key)?;
        self.promote(idx);
        self.slab[idx].as_ref().map(|e| &e.value)
    }

    /// Look up a value without touching recency
    #[must_use]
    pub fn peek(&self, key: &K) -> Option<&V> {
        let idx = *self.map.get(key)?;
        self.slab[idx].as_ref().map(|e| &e.value)
    }

    /// Check if a key is present without touching recency
    #[must_use]
    pub fn contains_key(&self, key: &K) -> bool {
        self.map.contains_key(key)
    }

    /// Insert or replace a value, marking it most-recently-used.
    ///
    /// A new key inserted at capacity first evicts the single
    /// least-recently-used entry, which is returned.
    pub fn set(&mut self, key: K, value: V) -> Option<(K, V)> {
        if let Some(&idx) = self.map.get(&key) {
            if let Some(entry) = self.slab[idx].as_mut() {
                entry.value = value;
            }
            self.promote(idx);
            return None;
        }

        let evicted = if self.map.len() == self.capacity {
            self.evict_lru()
        } else {
            None
        };

        let idx = match self.free.pop() {
            Some(idx) => idx,
            None => {
                self.slab.push(None);
                self.slab.len() - 1
            }
        };
        self.slab[idx] = Some(Entry {
            key: key.clone(),
            value,
            prev: NIL,
            next: NIL,
        });
        self.attach(idx);
        self.map.insert(key, idx);

        evicted
    }

    /// Remove a key, returning whether an entry was removed
    pub fn remove(&mut self, key: &K) -> bool {
        let Some(idx) = self.map.remove(key) else {
            return false;
        };
        self.detach(idx);
        self.slab[idx] = None;
        self.free.push(idx);
        true
    }

    /// Evict and return the least-recently-used entry
    pub fn evict_lru(&mut self) -> Option<(K, V)> {
        let idx = self.head;
        if idx == NIL {
            return None;
        }
        self.detach(idx);
        let entry = self.slab[idx].take()?;
        self.free.push(idx);
        self.map.remove(&entry.key);
        Some((entry.key, entry.value))
    }

    /// Drop all entries
    pub fn clear(&mut self) {
        self.map.clear();
        self.slab.clear();
        self.free.clear();
        self.head = NIL;
        self.tail = NIL;
    }

    /// Iterate entries in recency order, least-recently-used first
    pub fn entries(&self) -> impl Iterator<Item = (&K, &V)> {
        RecencyIter {
            cache: self,
            cursor: self.head,
        }
    }

    /// Iterate keys in recency order, least-recently-used first
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.entries().map(|(k, _)| k)
    }

    /// Iterate values in recency order, least-recently-used first
    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.entries().map(|(_, v)| v)
    }

    /// Move an existing entry to the most-recently-used position
    fn promote(&mut self, idx: usize) {
        if self.tail == idx {
            return;
        }
        self.detach(idx);
        self.attach(idx);
    }

    /// Unlink an entry from the recency list
    fn detach(&mut self, idx: usize) {
        let (prev, next) = match self.slab[idx].as_ref() {
            Some(entry) => (entry.prev, entry.next),
            None => return,
        };

        if prev == NIL {
            self.head = next;
        } else if let Some(p) = self.slab[prev].as_mut() {
            p.next = next;
        }

        if next == NIL {
            self.tail = prev;
        } else if let Some(n) = self.slab[next].as_mut() {
            n.prev = prev;
        }
    }

    /// Link an entry at the most-recently-used end
    fn attach(&mut self, idx: usize) {
        let tail = self.tail;
        if let Some(entry) = self.slab[idx].as_mut() {
            entry.prev = tail;
            entry.next = NIL;
        }
        if tail == NIL {
            self.head = idx;
        } else if let Some(t) = self.slab[tail].as_mut() {
            t.next = idx;
        }
        self.tail = idx;
    }
}

struct RecencyIter<'a, K, V> {
    cache: &'a BoundedCache<K, V>,
    cursor: usize,
}

impl<'a, K, V> Iterator for RecencyIter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        if self.cursor == NIL {
            return None;
        }
        let entry = self.cache.slab[self.cursor].as_ref()?;
        self.cursor = entry.next;
        Some((&entry.key, &entry.value))
    }
}
