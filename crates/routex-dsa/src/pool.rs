use alloc::vec::Vec;
use core::fmt;
use core::ops::{Index, IndexMut};

/// A stable handle into a [`NodePool`].
///
/// Handles are 32-bit offsets, not addresses: the pool may reallocate its
/// backing storage on growth and every previously issued handle still names
/// the same logical node afterwards.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct NodeIndex(u32);

static_assertions::assert_eq_size!(NodeIndex, u32);

impl NodeIndex {
    /// The first node ever allocated from a pool.
    pub const ROOT: NodeIndex = NodeIndex(0);

    #[inline(always)]
    pub fn get(self) -> usize {
        self.0 as usize
    }
}

/// Allocation failure: the pool hit its node limit or the allocator refused to grow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolExhausted {
    pub live: usize,
    pub limit: usize,
}

impl fmt::Display for PoolExhausted {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node pool exhausted ({} of {} nodes in use)", self.live, self.limit)
    }
}

impl core::error::Error for PoolExhausted {}

/// Append-only arena of nodes addressed by [`NodeIndex`].
///
/// Growth doubles the capacity (or grows by one when empty). Nodes are never
/// freed individually; the whole pool is released at once.
pub struct NodePool<T> {
    nodes: Vec<T>,
    limit: usize,
    reallocations: u32,
}

impl<T> fmt::Debug for NodePool<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodePool")
            .field("len", &self.nodes.len())
            .field("capacity", &self.nodes.capacity())
            .field("limit", &self.limit)
            .field("reallocations", &self.reallocations)
            .finish()
    }
}

impl<T: Default> NodePool<T> {
    /// Creates an empty pool with storage reserved for `capacity` nodes.
    /// `limit` caps the total node count.
    pub fn new(capacity: usize, limit: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(capacity.min(limit)),
            limit: limit.min(u32::MAX as usize),
            reallocations: 0,
        }
    }

    /// Appends a default-initialized node and returns its stable index.
    pub fn allocate(&mut self) -> Result<NodeIndex, PoolExhausted> {
        let live = self.nodes.len();
        if live >= self.limit {
            return Err(PoolExhausted { live, limit: self.limit });
        }

        if live == self.nodes.capacity() {
            let additional = live.max(1).min(self.limit - live);
            self.nodes
                .try_reserve_exact(additional)
                .map_err(|_| PoolExhausted { live, limit: self.limit })?;
            self.reallocations += 1;
            tracing::debug!(
                "NodePool: grew to {} slots (reallocation #{})",
                self.nodes.capacity(),
                self.reallocations
            );
        }

        self.nodes.push(T::default());
        Ok(NodeIndex(live as u32))
    }
}

impl<T> NodePool<T> {
    #[inline(always)]
    pub fn get(&self, idx: NodeIndex) -> Option<&T> {
        self.nodes.get(idx.get())
    }

    #[inline(always)]
    pub fn get_mut(&mut self, idx: NodeIndex) -> Option<&mut T> {
        self.nodes.get_mut(idx.get())
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.nodes.capacity()
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Number of times the backing storage has been reallocated.
    pub fn reallocations(&self) -> u32 {
        self.reallocations
    }

    /// Drops every node and releases the backing storage.
    pub fn release(&mut self) {
        self.nodes = Vec::new();
    }
}

impl<T> Index<NodeIndex> for NodePool<T> {
    type Output = T;

    #[inline(always)]
    fn index(&self, idx: NodeIndex) -> &T {
        &self.nodes[idx.get()]
    }
}

impl<T> IndexMut<NodeIndex> for NodePool<T> {
    #[inline(always)]
    fn index_mut(&mut self, idx: NodeIndex) -> &mut T {
        &mut self.nodes[idx.get()]
    }
}


#[cfg(kani)]
mod proofs {
    use super::*;

    #[kani::proof]
    #[kani::unwind(6)]
    fn prove_index_stability_across_growth() {
        let mut pool: NodePool<u32> = NodePool::new(1, 4);
        let first = pool.allocate().unwrap();
        pool[first] = 7;
        let n: usize = kani::any();
        kani::assume(n < 4);
        for _ in 0..n {
            let _ = pool.allocate();
        }
        // Growth moves the storage; the handle must still reach the same data.
        assert!(pool[first] == 7);
    }
}
