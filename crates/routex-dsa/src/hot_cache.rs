use alloc::boxed::Box;
use alloc::vec::Vec;
use core::fmt;

use crate::method::Method;

/// Default number of hot entries.
pub const DEFAULT_CAPACITY: usize = 16;

static_assertions::const_assert!(DEFAULT_CAPACITY > 0);

/// One resolved exact `(method, path) -> handler` association.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HotEntry<H> {
    pub method: Method,
    pub path: Box<str>,
    pub handler: H,
    pub access_count: u32,
}

/// Lookup counters for a [`HotPathCache`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    /// Entries written after a lookup missed and the route resolved elsewhere.
    pub fills: u64,
    pub evictions: u64,
}

impl CacheStats {
    /// Fraction of cacheable dispatches answered from the cache.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.fills;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Fixed-capacity cache of exact routes, scanned linearly.
///
/// ## Eviction
/// When full, the entry with the smallest `access_count` is overwritten.
/// Ties go to the first candidate at or after a round-robin cursor which
/// advances on every eviction. Only parameter-free matches are ever stored.
pub struct HotPathCache<H> {
    entries: Vec<HotEntry<H>>,
    capacity: usize,
    max_key_len: usize,
    cursor: usize,
    stats: CacheStats,
}

impl<H> fmt::Debug for HotPathCache<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HotPathCache")
            .field("len", &self.entries.len())
            .field("capacity", &self.capacity)
            .field("cursor", &self.cursor)
            .field("stats", &self.stats)
            .finish()
    }
}

impl<H: Clone> HotPathCache<H> {
    /// A capacity of zero disables the cache.
    pub fn new(capacity: usize, max_key_len: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            capacity,
            max_key_len,
            cursor: 0,
            stats: CacheStats::default(),
        }
    }

    /// Scans every slot for `(method, path)`; a hit bumps its access count.
    #[inline]
    pub fn lookup(&mut self, method: Method, path: &str) -> Option<H> {
        let entry = self
            .entries
            .iter_mut()
            .find(|e| e.method == method && &*e.path == path)?;
        entry.access_count = entry.access_count.saturating_add(1);
        self.stats.hits += 1;
        Some(entry.handler.clone())
    }

    /// Stores an exact association, evicting the coldest entry when full.
    ///
    /// Returns the evicted entry, if any. Keys longer than the configured
    /// bound are not cached.
    pub fn insert(&mut self, method: Method, path: &str, handler: H) -> Option<HotEntry<H>> {
        if self.capacity == 0 || path.len() > self.max_key_len {
            return None;
        }
        if let Some(existing) = self
            .entries
            .iter_mut()
            .find(|e| e.method == method && &*e.path == path)
        {
            existing.handler = handler;
            return None;
        }

        self.stats.fills += 1;
        let fresh = HotEntry {
            method,
            path: Box::from(path),
            handler,
            access_count: 0,
        };

        if self.entries.len() < self.capacity {
            self.entries.push(fresh);
            return None;
        }

        let victim = self.coldest_slot();
        self.cursor = (self.cursor + 1) % self.capacity;
        self.stats.evictions += 1;
        let evicted = core::mem::replace(&mut self.entries[victim], fresh);
        tracing::trace!(
            "HotPathCache: evicted {} {} (access_count {})",
            evicted.method,
            evicted.path,
            evicted.access_count
        );
        Some(evicted)
    }

    fn coldest_slot(&self) -> usize {
        let len = self.entries.len();
        let mut best = self.cursor % len;
        for step in 1..len {
            let slot = (self.cursor + step) % len;
            if self.entries[slot].access_count < self.entries[best].access_count {
                best = slot;
            }
        }
        best
    }
}

impl<H> HotPathCache<H> {
    pub fn contains(&self, method: Method, path: &str) -> bool {
        self.entries.iter().any(|e| e.method == method && &*e.path == path)
    }

    /// Access count of a cached key, without touching it.
    pub fn access_count(&self, method: Method, path: &str) -> Option<u32> {
        self.entries
            .iter()
            .find(|e| e.method == method && &*e.path == path)
            .map(|e| e.access_count)
    }

    pub fn entries(&self) -> &[HotEntry<H>] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    /// Drops every entry; statistics are kept.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.cursor = 0;
    }
}

#[cfg(test)]
mod tests {
    extern crate std;
    use super::*;
    use std::format;

    #[test]
    fn test_occupancy_never_exceeds_capacity() {
        let mut cache = HotPathCache::new(4, 64);
        for i in 0..20u32 {
            cache.insert(Method::Get, &format!("/r{}", i), i);
            assert!(cache.len() <= 4);
        }
        assert_eq!(cache.len(), 4);
        assert_eq!(cache.stats().evictions, 16);
    }

    #[test]
    fn test_lowest_access_count_is_evicted() {
        let mut cache = HotPathCache::new(3, 64);
        cache.insert(Method::Get, "/a", 1);
        cache.insert(Method::Get, "/b", 2);
        cache.insert(Method::Get, "/c", 3);
        cache.lookup(Method::Get, "/a");
        cache.lookup(Method::Get, "/a");
        cache.lookup(Method::Get, "/c");

        let evicted = cache.insert(Method::Get, "/d", 4).unwrap();
        assert_eq!(&*evicted.path, "/b");
        assert_eq!(evicted.access_count, 0);
        assert!(cache.contains(Method::Get, "/d"));
        assert!(!cache.contains(Method::Get, "/b"));
    }

    #[test]
    fn test_ties_rotate_with_cursor() {
        let mut cache = HotPathCache::new(3, 64);
        cache.insert(Method::Get, "/a", 1);
        cache.insert(Method::Get, "/b", 2);
        cache.insert(Method::Get, "/c", 3);
        for key in ["/a", "/b", "/c"] {
            cache.lookup(Method::Get, key);
        }

        // All tied at 1: cursor starts at slot 0.
        let first = cache.insert(Method::Get, "/d", 4).unwrap();
        assert_eq!(&*first.path, "/a");
        // Warm "/d" (slot 0) past the others.
        cache.lookup(Method::Get, "/d");
        cache.lookup(Method::Get, "/d");
        // Slots 1 and 2 tie at 1; the cursor has moved to slot 1.
        let second = cache.insert(Method::Get, "/e", 5).unwrap();
        assert_eq!(&*second.path, "/b");
    }

    #[test]
    fn test_hits_bump_access_count() {
        let mut cache = HotPathCache::new(2, 64);
        cache.insert(Method::Post, "/x", 7);
        assert_eq!(cache.lookup(Method::Post, "/x"), Some(7));
        assert_eq!(cache.lookup(Method::Get, "/x"), None);
        assert_eq!(cache.access_count(Method::Post, "/x"), Some(1));
        assert_eq!(cache.stats().hits, 1);
    }

    #[test]
    fn test_oversized_keys_and_zero_capacity_are_ignored() {
        let mut cache = HotPathCache::new(2, 4);
        assert!(cache.insert(Method::Get, "/toolong", 1).is_none());
        assert!(cache.is_empty());

        let mut off: HotPathCache<u32> = HotPathCache::new(0, 64);
        off.insert(Method::Get, "/a", 1);
        assert!(off.is_empty());
    }

    #[test]
    fn test_hit_rate() {
        let stats = CacheStats { hits: 3, fills: 1, evictions: 0 };
        assert_eq!(stats.hit_rate(), 0.75);
        assert_eq!(CacheStats::default().hit_rate(), 0.0);
    }
}
