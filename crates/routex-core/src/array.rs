use routex_dsa::{Method, SegmentedPath};

use crate::error::RouterError;
use crate::route::RouteEntry;

/// Flat, registration-ordered route list scanned linearly.
///
/// Patterns are compared segment by segment as literal text, so empty
/// interior segments are ignored the same way the trie ignores them; no
/// parameters are extracted. A method-specific entry wins over an `Any`
/// entry for the same path.
#[derive(Debug, Default)]
pub struct ArrayRouter<H> {
    entries: Vec<RouteEntry<H>>,
}

impl<H> ArrayRouter<H> {
    pub fn new() -> Self {
        Self { entries: Vec::new() }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    pub fn contains(&self, method: Method, pattern: &str) -> bool {
        self.entries
            .iter()
            .any(|e| e.method == method && &*e.pattern == pattern)
    }

    /// Appends an entry. Duplicates are rejected without touching the list.
    pub fn add(&mut self, method: Method, pattern: &str, handler: H) -> Result<(), RouterError> {
        if self.contains(method, pattern) {
            return Err(RouterError::duplicate(method, pattern));
        }
        self.entries.push(RouteEntry::new(method, pattern, handler));
        Ok(())
    }

    #[inline]
    pub fn find(&self, method: Method, path: &SegmentedPath<'_>) -> Option<&H> {
        let mut wildcard = None;
        for entry in &self.entries {
            if !entry.method.accepts(method) || !same_segments(&entry.pattern, path) {
                continue;
            }
            if entry.method == method {
                return Some(&entry.handler);
            }
            wildcard.get_or_insert(&entry.handler);
        }
        wildcard
    }

    pub fn entries(&self) -> &[RouteEntry<H>] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drops every entry and the backing storage.
    pub fn release(&mut self) {
        self.entries = Vec::new();
    }
}

fn same_segments(pattern: &str, path: &SegmentedPath<'_>) -> bool {
    if pattern == path.as_str() {
        return true;
    }
    pattern.split('/').filter(|s| !s.is_empty()).eq(path.segments())
}
