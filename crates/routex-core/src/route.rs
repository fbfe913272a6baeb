use routex_dsa::{Method, Params};

/// A registered route. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteEntry<H> {
    pub method: Method,
    pub pattern: Box<str>,
    pub handler: H,
    /// Prefix-matched overlay consulted before dynamic routing.
    pub is_static_overlay: bool,
}

impl<H> RouteEntry<H> {
    pub fn new(method: Method, pattern: &str, handler: H) -> Self {
        Self {
            method,
            pattern: Box::from(pattern),
            handler,
            is_static_overlay: false,
        }
    }

    pub fn overlay(prefix: &str, handler: H) -> Self {
        Self {
            method: Method::Any,
            pattern: Box::from(prefix),
            handler,
            is_static_overlay: true,
        }
    }
}

/// Which stage of the dispatch pipeline produced a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchSource {
    StaticOverlay,
    HotCache,
    Array,
    HashIndex,
    Trie,
    Fallback,
}

/// Result of a successful dispatch.
///
/// Parameter values borrow from the dispatched path and are only valid while
/// that buffer is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch<'p, H> {
    pub handler: H,
    pub params: Params<'p>,
    pub source: MatchSource,
}

impl<'p, H> RouteMatch<'p, H> {
    pub(crate) fn bare(handler: H, source: MatchSource) -> Self {
        Self {
            handler,
            params: Params::new(),
            source,
        }
    }

    pub fn param(&self, name: &str) -> Option<&'p str> {
        self.params.get(name)
    }
}
