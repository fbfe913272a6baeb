use alloc::boxed::Box;
use alloc::collections::BTreeMap;
use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use crate::method::Method;
use crate::pool::{NodeIndex, NodePool, PoolExhausted};
use crate::segment::{PatternSegment, SegmentedPath, Segments};

/// A node in the segment trie.
///
/// - Literal children are keyed by their exact segment text.
/// - At most one parameter child, which carries the bound parameter name.
/// - Handlers are stored per registration method; a node with any handler is a leaf.
///
/// Nodes reference each other only through [`NodeIndex`] handles into the
/// owning [`NodePool`].
pub struct TrieNode<H> {
    label: Box<str>,
    children: BTreeMap<Box<str>, NodeIndex>,
    param: Option<ParamEdge>,
    handlers: Vec<(Method, H)>,
}

struct ParamEdge {
    name: Rc<str>,
    child: NodeIndex,
}

impl<H> Default for TrieNode<H> {
    fn default() -> Self {
        Self {
            label: Box::from(""),
            children: BTreeMap::new(),
            param: None,
            handlers: Vec::new(),
        }
    }
}

impl<H> TrieNode<H> {
    /// Segment text for literal nodes, `:name` for parameter nodes, empty for the root.
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn is_leaf(&self) -> bool {
        !self.handlers.is_empty()
    }

    #[inline]
    pub fn literal_child(&self, segment: &str) -> Option<NodeIndex> {
        self.children.get(segment).copied()
    }

    pub fn param_child(&self) -> Option<(&str, NodeIndex)> {
        self.param.as_ref().map(|e| (&*e.name, e.child))
    }

    /// The handler serving `method`: an exact registration beats `Any`.
    #[inline]
    pub fn handler_for(&self, method: Method) -> Option<&H> {
        let mut wildcard = None;
        for (registered, handler) in &self.handlers {
            if !registered.accepts(method) {
                continue;
            }
            if *registered == method {
                return Some(handler);
            }
            wildcard = Some(handler);
        }
        wildcard
    }
}

/// Registration failures raised by the trie itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrieError {
    /// The terminal node already has a handler for this method.
    Duplicate,
    /// A different parameter name is already bound at this position.
    ParamConflict { existing: String, requested: String },
    Exhausted(PoolExhausted),
}

impl fmt::Display for TrieError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrieError::Duplicate => f.write_str("handler already registered for this method"),
            TrieError::ParamConflict { existing, requested } => write!(
                f,
                "parameter `:{}` conflicts with `:{}` at the same position",
                requested, existing
            ),
            TrieError::Exhausted(e) => write!(f, "{}", e),
        }
    }
}

impl core::error::Error for TrieError {}

impl From<PoolExhausted> for TrieError {
    fn from(e: PoolExhausted) -> Self {
        TrieError::Exhausted(e)
    }
}

/// Parameter bindings of a match, in pattern order.
///
/// Names are shared with the trie; values are views into the dispatched path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params<'p> {
    pairs: Vec<(Rc<str>, &'p str)>,
}

impl<'p> Params<'p> {
    pub const fn new() -> Self {
        Self { pairs: Vec::new() }
    }

    pub fn get(&self, name: &str) -> Option<&'p str> {
        self.pairs
            .iter()
            .find(|(n, _)| &**n == name)
            .map(|(_, v)| *v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &'p str)> + '_ {
        self.pairs.iter().map(|(n, v)| (&**n, *v))
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    fn push(&mut self, name: Rc<str>, value: &'p str) {
        self.pairs.push((name, value));
    }

    fn pop(&mut self) {
        self.pairs.pop();
    }
}

/// Segment-indexed prefix tree backed by a [`NodePool`].
///
/// ## Precedence
/// At every level a literal child is tried before the parameter child, so
/// `/users/new` wins over `/users/:id`. When the literal branch dead-ends the
/// search falls back to the parameter branch of the same node. Each node
/// offers at most two branches, and recursion depth is bounded by the depth
/// of the longest registered pattern.
pub struct SegmentTrie<H> {
    pool: NodePool<TrieNode<H>>,
    routes: usize,
    depth: usize,
}

impl<H> fmt::Debug for SegmentTrie<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SegmentTrie")
            .field("nodes", &self.pool.len())
            .field("routes", &self.routes)
            .field("depth", &self.depth)
            .finish()
    }
}

impl<H: Clone> SegmentTrie<H> {
    /// The root node is allocated on first insertion.
    pub fn new(initial_capacity: usize, max_nodes: usize) -> Self {
        Self {
            pool: NodePool::new(initial_capacity, max_nodes),
            routes: 0,
            depth: 0,
        }
    }

    /// Registers `pattern` for `method`.
    ///
    /// Conflicts are detected before any node is created, so a rejected
    /// registration leaves the trie untouched. Pool exhaustion part-way
    /// through may leave handler-less nodes behind; they are unreachable as
    /// matches.
    pub fn insert(&mut self, method: Method, pattern: &str, handler: H) -> Result<(), TrieError> {
        self.check_conflicts(method, pattern)?;

        let mut current = self.root()?;
        let mut depth = 0;
        for segment in pattern.split('/').filter(|s| !s.is_empty()) {
            depth += 1;
            current = match PatternSegment::classify(segment) {
                PatternSegment::Literal(text) => self.literal_step(current, text)?,
                PatternSegment::Param(name) => self.param_step(current, name)?,
            };
        }

        self.pool[current].handlers.push((method, handler));
        self.routes += 1;
        self.depth = self.depth.max(depth);
        Ok(())
    }

    /// Resolves a path, returning a clone of the handler and the bindings.
    pub fn find<'p>(&self, method: Method, path: &SegmentedPath<'p>) -> Option<(H, Params<'p>)> {
        if self.pool.is_empty() {
            return None;
        }
        let segments = path.segments();
        // No registered pattern is deeper than `depth`.
        if segments.clone().count() > self.depth {
            return None;
        }

        let mut params = Params::new();
        let handler = self.descend(NodeIndex::ROOT, segments, method, &mut params)?;
        Some((handler.clone(), params))
    }

    fn descend<'p>(
        &self,
        node: NodeIndex,
        mut rest: Segments<'p>,
        method: Method,
        params: &mut Params<'p>,
    ) -> Option<&H> {
        let current = &self.pool[node];
        let Some(segment) = rest.next() else {
            return current.handler_for(method);
        };

        if let Some(child) = current.literal_child(segment) {
            if let Some(found) = self.descend(child, rest.clone(), method, params) {
                return Some(found);
            }
        }

        // Literal branch absent or a dead end: bind the segment instead.
        let edge = current.param.as_ref()?;
        params.push(Rc::clone(&edge.name), segment);
        let found = self.descend(edge.child, rest, method, params);
        if found.is_none() {
            params.pop();
        }
        found
    }

    /// Walks the trie along a registration pattern without creating nodes.
    pub fn node_at(&self, pattern: &str) -> Option<&TrieNode<H>> {
        let mut current = self.pool.get(NodeIndex::ROOT)?;
        for segment in pattern.split('/').filter(|s| !s.is_empty()) {
            let next = match PatternSegment::classify(segment) {
                PatternSegment::Literal(text) => current.literal_child(text)?,
                PatternSegment::Param(_) => current.param_child()?.1,
            };
            current = &self.pool[next];
        }
        Some(current)
    }

    fn check_conflicts(&self, method: Method, pattern: &str) -> Result<(), TrieError> {
        let Some(mut current) = self.pool.get(NodeIndex::ROOT) else {
            return Ok(());
        };
        for segment in pattern.split('/').filter(|s| !s.is_empty()) {
            let next = match PatternSegment::classify(segment) {
                PatternSegment::Literal(text) => current.literal_child(text),
                PatternSegment::Param(name) => match &current.param {
                    Some(edge) if &*edge.name != name => {
                        return Err(TrieError::ParamConflict {
                            existing: String::from(&*edge.name),
                            requested: String::from(name),
                        });
                    }
                    Some(edge) => Some(edge.child),
                    None => None,
                },
            };
            match next {
                Some(idx) => current = &self.pool[idx],
                // Everything below here would be freshly created.
                None => return Ok(()),
            }
        }

        if current.handlers.iter().any(|(m, _)| *m == method) {
            Err(TrieError::Duplicate)
        } else {
            Ok(())
        }
    }

    fn root(&mut self) -> Result<NodeIndex, PoolExhausted> {
        if self.pool.is_empty() {
            self.pool.allocate()
        } else {
            Ok(NodeIndex::ROOT)
        }
    }

    fn literal_step(&mut self, parent: NodeIndex, text: &str) -> Result<NodeIndex, PoolExhausted> {
        if let Some(existing) = self.pool[parent].literal_child(text) {
            return Ok(existing);
        }
        let child = self.pool.allocate()?;
        self.pool[child].label = Box::from(text);
        self.pool[parent].children.insert(Box::from(text), child);
        Ok(child)
    }

    fn param_step(&mut self, parent: NodeIndex, name: &str) -> Result<NodeIndex, PoolExhausted> {
        if let Some(edge) = &self.pool[parent].param {
            return Ok(edge.child);
        }
        let child = self.pool.allocate()?;
        let mut label = String::with_capacity(name.len() + 1);
        label.push(':');
        label.push_str(name);
        self.pool[child].label = label.into_boxed_str();
        self.pool[parent].param = Some(ParamEdge {
            name: Rc::from(name),
            child,
        });
        Ok(child)
    }
}

impl<H> SegmentTrie<H> {
    pub fn node_count(&self) -> usize {
        self.pool.len()
    }

    pub fn route_count(&self) -> usize {
        self.routes
    }

    /// Segment count of the longest registered pattern.
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn release(&mut self) {
        self.pool.release();
        self.routes = 0;
        self.depth = 0;
    }
}
