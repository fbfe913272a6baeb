//! # routex-dsa: Dispatch-Path Data Structures
//!
//! Everything the router touches on the per-request hot path lives here:
//! the path segmenter, the index-addressed node pool, the segment trie, the
//! fixed-capacity hot-path cache and the chained hash bucket index.
//!
//! All structures are single-threaded by construction. Handlers are stored
//! as an opaque `H: Clone` so the crate stays free of any HTTP types.
#![no_std]
extern crate alloc;

pub mod method;
pub mod segment;
pub mod pool;
pub mod trie;
pub mod hot_cache;
pub mod bucket;

pub use method::Method;
pub use segment::{split, PatternSegment, SegmentedPath, Segments, ROOT_PATH};
pub use pool::{NodeIndex, NodePool, PoolExhausted};
pub use trie::{Params, SegmentTrie, TrieError, TrieNode};
pub use hot_cache::{CacheStats, HotEntry, HotPathCache};
pub use bucket::{route_hash, HashBucketIndex};
