use alloc::boxed::Box;
use alloc::vec;
use alloc::vec::Vec;
use core::fmt;

use crate::method::Method;
use crate::pool::PoolExhausted;

/// Default bucket count.
pub const DEFAULT_BUCKETS: usize = 256;

const NIL: u32 = u32::MAX;

/// Entries are addressed by `u32` and `NIL` is reserved, so this is the hard cap.
pub const MAX_ENTRIES: usize = NIL as usize;

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

struct BucketEntry<H> {
    hash: u64,
    method: Method,
    path: Box<str>,
    handler: H,
    /// Next entry in the same bucket, or `NIL`.
    next: u32,
}

/// Chained hash table over exact `(method, path)` keys.
///
/// Entries live in a single arena and are linked per bucket through 32-bit
/// offsets. Insertion prepends to the chain. There is no removal: entries
/// are released together with the index.
pub struct HashBucketIndex<H> {
    heads: Vec<u32>,
    entries: Vec<BucketEntry<H>>,
    mask: usize,
    limit: usize,
}

impl<H> fmt::Debug for HashBucketIndex<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HashBucketIndex")
            .field("buckets", &self.heads.len())
            .field("entries", &self.entries.len())
            .finish()
    }
}

/// FNV-1a over the method tag followed by the path bytes.
#[inline]
pub fn route_hash(method: Method, path: &str) -> u64 {
    let mut hash = FNV_OFFSET;
    hash ^= method as u8 as u64;
    hash = hash.wrapping_mul(FNV_PRIME);
    for &byte in path.as_bytes() {
        hash ^= byte as u64;
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

impl<H> HashBucketIndex<H> {
    /// `buckets` is rounded up to a power of two (minimum 1).
    pub fn new(buckets: usize) -> Self {
        Self::with_limit(buckets, MAX_ENTRIES)
    }

    /// Like [`new`](Self::new), holding at most `limit` entries (capped at [`MAX_ENTRIES`]).
    pub fn with_limit(buckets: usize, limit: usize) -> Self {
        let buckets = buckets.max(1).next_power_of_two();
        Self {
            heads: vec![NIL; buckets],
            entries: Vec::new(),
            mask: buckets - 1,
            limit: limit.min(MAX_ENTRIES),
        }
    }

    /// Fails when one more entry would exceed the limit.
    #[inline]
    pub fn check_room(&self) -> Result<(), PoolExhausted> {
        let live = self.entries.len();
        if live >= self.limit {
            return Err(PoolExhausted { live, limit: self.limit });
        }
        Ok(())
    }

    /// Prepends an entry to its bucket chain.
    ///
    /// Duplicate keys must be filtered by the caller; a later duplicate
    /// would shadow the earlier one.
    pub fn insert(&mut self, method: Method, path: &str, handler: H) -> Result<(), PoolExhausted> {
        self.check_room()?;
        let live = self.entries.len();
        let idx = u32::try_from(live).map_err(|_| PoolExhausted { live, limit: self.limit })?;
        let hash = route_hash(method, path);
        let bucket = (hash as usize) & self.mask;
        self.entries.push(BucketEntry {
            hash,
            method,
            path: Box::from(path),
            handler,
            next: self.heads[bucket],
        });
        self.heads[bucket] = idx;
        Ok(())
    }

    /// Exact lookup: the requested method first, then the `Any` registration.
    #[inline]
    pub fn lookup(&self, method: Method, path: &str) -> Option<&H> {
        self.find_exact(method, path).or_else(|| {
            if method == Method::Any {
                None
            } else {
                self.find_exact(Method::Any, path)
            }
        })
    }

    fn find_exact(&self, method: Method, path: &str) -> Option<&H> {
        let hash = route_hash(method, path);
        let mut cursor = self.heads[(hash as usize) & self.mask];
        while cursor != NIL {
            let entry = &self.entries[cursor as usize];
            if entry.hash == hash && entry.method == method && &*entry.path == path {
                return Some(&entry.handler);
            }
            cursor = entry.next;
        }
        None
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn bucket_count(&self) -> usize {
        self.heads.len()
    }

    /// Length of the longest chain.
    pub fn max_chain_len(&self) -> usize {
        self.heads
            .iter()
            .map(|&head| {
                let mut len = 0;
                let mut cursor = head;
                while cursor != NIL {
                    len += 1;
                    cursor = self.entries[cursor as usize].next;
                }
                len
            })
            .max()
            .unwrap_or(0)
    }

    pub fn release(&mut self) {
        self.entries = Vec::new();
        self.heads.fill(NIL);
    }
}

#[cfg(test)]
mod tests {
    extern crate std;
    use super::*;
    use std::format;

    #[test]
    fn test_exact_lookup() {
        let mut index = HashBucketIndex::new(16);
        index.insert(Method::Get, "/users", 1).unwrap();
        index.insert(Method::Post, "/users", 2).unwrap();
        assert_eq!(index.lookup(Method::Get, "/users"), Some(&1));
        assert_eq!(index.lookup(Method::Post, "/users"), Some(&2));
        assert_eq!(index.lookup(Method::Put, "/users"), None);
        assert_eq!(index.lookup(Method::Get, "/users/"), None);
    }

    #[test]
    fn test_any_registration_serves_every_method() {
        let mut index = HashBucketIndex::new(16);
        index.insert(Method::Any, "/ping", 1).unwrap();
        index.insert(Method::Get, "/ping", 2).unwrap();
        assert_eq!(index.lookup(Method::Get, "/ping"), Some(&2));
        assert_eq!(index.lookup(Method::Head, "/ping"), Some(&1));
        assert_eq!(index.lookup(Method::Any, "/ping"), Some(&1));
    }

    #[test]
    fn test_collisions_chain_within_one_bucket() {
        let mut index = HashBucketIndex::new(1);
        for i in 0..50u32 {
            index.insert(Method::Get, &format!("/r/{}", i), i).unwrap();
        }
        assert_eq!(index.bucket_count(), 1);
        assert_eq!(index.max_chain_len(), 50);
        for i in 0..50u32 {
            assert_eq!(index.lookup(Method::Get, &format!("/r/{}", i)), Some(&i));
        }
    }

    #[test]
    fn test_bucket_count_rounds_to_power_of_two() {
        let index: HashBucketIndex<u8> = HashBucketIndex::new(200);
        assert_eq!(index.bucket_count(), 256);
        let index: HashBucketIndex<u8> = HashBucketIndex::new(0);
        assert_eq!(index.bucket_count(), 1);
    }

    #[test]
    fn test_hash_depends_on_method() {
        assert_ne!(route_hash(Method::Get, "/a"), route_hash(Method::Post, "/a"));
        assert_eq!(route_hash(Method::Get, "/a"), route_hash(Method::Get, "/a"));
    }

    #[test]
    fn test_release() {
        let mut index = HashBucketIndex::new(8);
        index.insert(Method::Get, "/a", 1).unwrap();
        index.release();
        assert!(index.is_empty());
        assert_eq!(index.lookup(Method::Get, "/a"), None);
    }

    #[test]
    fn test_insert_past_limit_is_rejected() {
        let mut index = HashBucketIndex::with_limit(4, 2);
        index.insert(Method::Get, "/a", 1).unwrap();
        index.insert(Method::Get, "/b", 2).unwrap();
        let err = index.insert(Method::Get, "/c", 3).unwrap_err();
        assert_eq!(err, PoolExhausted { live: 2, limit: 2 });
        assert_eq!(index.len(), 2);
        assert_eq!(index.lookup(Method::Get, "/c"), None);
    }

    #[test]
    fn test_limit_never_exceeds_addressable_entries() {
        let index: HashBucketIndex<u8> = HashBucketIndex::with_limit(4, usize::MAX);
        assert!(index.check_room().is_ok());
        assert_eq!(index.limit, MAX_ENTRIES);
    }
}
