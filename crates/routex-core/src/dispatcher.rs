//! The routing facade.
//!
//! ## Dispatch order
//! 1. Static overlays (longest matching prefix).
//! 2. Hot-path cache, keyed by the exact `(method, path)`.
//! 3. Array scan, or in trie mode the hash index followed by trie descent.
//! 4. The fallback handler.
//!
//! A dispatcher starts in array mode and switches to trie mode once, either
//! when the array outgrows `migration_threshold` or when the first
//! parameterized pattern is registered.

use std::fmt;
use std::marker::PhantomData;
use std::rc::Rc;

use routex_dsa::{split, CacheStats, HashBucketIndex, HotPathCache, Method, SegmentTrie, SegmentedPath, ROOT_PATH};

use crate::array::ArrayRouter;
use crate::config::{OversizedPathPolicy, RouterConfig};
use crate::error::{NotFound, RouterError};
use crate::pattern::{self, ValidPattern};
use crate::route::{MatchSource, RouteEntry, RouteMatch};

/// Which representation currently holds the dynamic routes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouterMode {
    Array,
    Trie,
}

/// Single-threaded router owning every route, cache and index it consults.
///
/// Not `Send`: build one per worker thread.
pub struct Dispatcher<H> {
    config: RouterConfig,
    mode: RouterMode,
    array: ArrayRouter<H>,
    trie: SegmentTrie<H>,
    index: HashBucketIndex<H>,
    hot: HotPathCache<H>,
    /// Sorted longest prefix first.
    overlays: Vec<RouteEntry<H>>,
    fallback: Option<H>,
    routes: usize,
    _thread_bound: PhantomData<Rc<()>>,
}

static_assertions::assert_not_impl_any!(Dispatcher<u32>: Send, Sync);

impl<H> fmt::Debug for Dispatcher<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("mode", &self.mode)
            .field("routes", &self.routes)
            .field("overlays", &self.overlays.len())
            .field("fallback", &self.fallback.is_some())
            .field("trie", &self.trie)
            .field("hot", &self.hot)
            .finish()
    }
}

impl<H: Clone> Default for Dispatcher<H> {
    fn default() -> Self {
        Self::new(RouterConfig::default())
    }
}

impl<H: Clone> Dispatcher<H> {
    pub fn new(config: RouterConfig) -> Self {
        Self {
            mode: RouterMode::Array,
            array: ArrayRouter::with_capacity(config.migration_threshold),
            trie: SegmentTrie::new(config.initial_node_capacity, config.max_nodes),
            index: HashBucketIndex::new(config.hash_buckets),
            hot: HotPathCache::new(config.hot_cache_capacity, config.hot_cache_max_key_len),
            overlays: Vec::new(),
            fallback: None,
            routes: 0,
            _thread_bound: PhantomData,
            config,
        }
    }

    /// Registers `pattern` for `method`.
    ///
    /// A rejected registration leaves every structure as it was, except for
    /// pool exhaustion inside the trie, which is fatal for the router.
    pub fn register(&mut self, method: Method, pattern: &str, handler: H) -> Result<(), RouterError> {
        let valid = pattern::validate(pattern, &self.config)?;
        let path = valid.normalized;

        if self.mode == RouterMode::Array {
            if self.array.contains(method, path) {
                return Err(RouterError::duplicate(method, path));
            }
            if valid.has_params() || self.array.len() >= self.config.migration_threshold {
                self.migrate()?;
            }
        }

        match self.mode {
            RouterMode::Array => self.array.add(method, path, handler)?,
            RouterMode::Trie => self.insert_dynamic(method, valid, handler)?,
        }

        self.routes += 1;
        self.hot.clear();
        tracing::debug!("Dispatcher: registered {} {} ({:?} mode, {} routes)", method, path, self.mode, self.routes);
        Ok(())
    }

    /// Registers `pattern` for every method without a specific handler.
    pub fn register_any(&mut self, pattern: &str, handler: H) -> Result<(), RouterError> {
        self.register(Method::Any, pattern, handler)
    }

    /// Registers a prefix route consulted before any dynamic routing.
    ///
    /// Prefixes match on segment boundaries: `/static` covers `/static` and
    /// `/static/app.js` but not `/statically`.
    pub fn register_static_overlay(&mut self, prefix: &str, handler: H) -> Result<(), RouterError> {
        let valid = pattern::validate(prefix, &self.config)?;
        let prefix = valid.normalized;
        if self.overlays.iter().any(|o| &*o.pattern == prefix) {
            return Err(RouterError::duplicate(Method::Any, prefix));
        }

        let at = self
            .overlays
            .iter()
            .position(|o| o.pattern.len() < prefix.len())
            .unwrap_or(self.overlays.len());
        self.overlays.insert(at, RouteEntry::overlay(prefix, handler));
        self.hot.clear();
        tracing::debug!("Dispatcher: registered static overlay {}", prefix);
        Ok(())
    }

    /// Sets the handler returned when nothing else matches, replacing any previous one.
    pub fn register_fallback(&mut self, handler: H) {
        if self.fallback.replace(handler).is_some() {
            tracing::debug!("Dispatcher: replaced fallback handler");
        }
    }

    /// Resolves a request target.
    ///
    /// Parameter values in the returned match borrow from `raw`.
    pub fn dispatch<'p>(&mut self, method: Method, raw: &'p str) -> Result<RouteMatch<'p, H>, NotFound> {
        let path = self.resolve(raw)?;
        let key = path.as_str();

        if let Some(overlay) = self.overlays.iter().find(|o| covers(&o.pattern, key)) {
            return Ok(RouteMatch::bare(overlay.handler.clone(), MatchSource::StaticOverlay));
        }

        if let Some(handler) = self.hot.lookup(method, key) {
            return Ok(RouteMatch::bare(handler, MatchSource::HotCache));
        }

        if let Some(found) = self.find_dynamic(method, &path) {
            if found.params.is_empty() {
                self.hot.insert(method, key, found.handler.clone());
            }
            return Ok(found);
        }

        match &self.fallback {
            Some(handler) => Ok(RouteMatch::bare(handler.clone(), MatchSource::Fallback)),
            None => Err(NotFound),
        }
    }

    /// Moves every array route into the trie and hash index.
    ///
    /// Runs at most once; a no-op in trie mode. The new structures are staged
    /// and only swapped in when every route has been re-registered, so a
    /// failure leaves the router in array mode with its routes intact. The
    /// hot cache is emptied once the swap is done.
    pub fn migrate(&mut self) -> Result<(), RouterError> {
        if self.mode == RouterMode::Trie {
            return Ok(());
        }

        let mut trie = SegmentTrie::new(self.config.initial_node_capacity, self.config.max_nodes);
        let mut index = HashBucketIndex::new(self.config.hash_buckets);
        let staged = self.array.entries().iter().try_for_each(|entry| {
            let valid = pattern::validate(&entry.pattern, &self.config)?;
            trie.insert(entry.method, valid.normalized, entry.handler.clone())
                .map_err(|e| RouterError::from_trie(e, entry.method, valid.normalized))?;
            if !valid.has_params() {
                index.insert(entry.method, valid.normalized, entry.handler.clone())?;
            }
            Ok::<(), RouterError>(())
        });

        if let Err(e) = staged {
            tracing::warn!("Dispatcher: migration to trie mode aborted, staying in array mode: {}", e);
            return Err(e);
        }

        self.trie = trie;
        self.index = index;
        self.array.release();
        self.hot.clear();
        self.mode = RouterMode::Trie;
        tracing::info!(
            "Dispatcher: migrated to trie mode, {} routes, {} nodes",
            self.routes,
            self.trie.node_count()
        );
        Ok(())
    }

    /// Releases every route, overlay, cache entry and node, returning to a
    /// fresh array-mode router with the same configuration.
    pub fn teardown(&mut self) {
        self.array.release();
        self.trie.release();
        self.index.release();
        self.hot = HotPathCache::new(self.config.hot_cache_capacity, self.config.hot_cache_max_key_len);
        self.overlays = Vec::new();
        self.fallback = None;
        self.routes = 0;
        self.mode = RouterMode::Array;
    }

    fn insert_dynamic(&mut self, method: Method, valid: ValidPattern<'_>, handler: H) -> Result<(), RouterError> {
        let path = valid.normalized;
        if valid.has_params() {
            self.trie
                .insert(method, path, handler)
                .map_err(|e| RouterError::from_trie(e, method, path))
        } else {
            self.index.check_room()?;
            self.trie
                .insert(method, path, handler.clone())
                .map_err(|e| RouterError::from_trie(e, method, path))?;
            self.index.insert(method, path, handler)?;
            Ok(())
        }
    }

    fn find_dynamic<'p>(&self, method: Method, path: &SegmentedPath<'p>) -> Option<RouteMatch<'p, H>> {
        match self.mode {
            RouterMode::Array => self
                .array
                .find(method, path)
                .map(|h| RouteMatch::bare(h.clone(), MatchSource::Array)),
            RouterMode::Trie => {
                if let Some(h) = self.index.lookup(method, path.as_str()) {
                    return Some(RouteMatch::bare(h.clone(), MatchSource::HashIndex));
                }
                self.trie.find(method, path).map(|(handler, params)| RouteMatch {
                    handler,
                    params,
                    source: MatchSource::Trie,
                })
            }
        }
    }

    fn resolve<'p>(&self, raw: &'p str) -> Result<SegmentedPath<'p>, NotFound> {
        let path = split(raw, self.config.max_path_len);
        if path.was_substituted() {
            let len = raw.find('?').unwrap_or(raw.len());
            if len > self.config.max_path_len {
                match self.config.oversized_path {
                    OversizedPathPolicy::Reject => return Err(NotFound),
                    OversizedPathPolicy::Root => {
                        tracing::warn!("Dispatcher: path of {} bytes exceeds {}, dispatching as /", len, self.config.max_path_len)
                    }
                }
            }
        }
        Ok(path)
    }
}

impl<H> Dispatcher<H> {
    pub fn mode(&self) -> RouterMode {
        self.mode
    }

    /// Number of dynamic routes; overlays and the fallback are not counted.
    pub fn route_count(&self) -> usize {
        self.routes
    }

    pub fn node_count(&self) -> usize {
        self.trie.node_count()
    }

    pub fn overlay_count(&self) -> usize {
        self.overlays.len()
    }

    pub fn has_fallback(&self) -> bool {
        self.fallback.is_some()
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.hot.stats()
    }

    pub fn hot_cache(&self) -> &HotPathCache<H> {
        &self.hot
    }

    pub fn config(&self) -> &RouterConfig {
        &self.config
    }
}

fn covers(prefix: &str, path: &str) -> bool {
    if prefix == ROOT_PATH {
        return true;
    }
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small(threshold: usize) -> Dispatcher<u32> {
        Dispatcher::new(RouterConfig {
            migration_threshold: threshold,
            ..RouterConfig::default()
        })
    }

    #[test]
    fn test_array_mode_exact_dispatch() {
        let mut d = small(16);
        d.register(Method::Get, "/health", 1).unwrap();
        d.register(Method::Post, "/health", 2).unwrap();

        let m = d.dispatch(Method::Get, "/health").unwrap();
        assert_eq!(m.handler, 1);
        assert_eq!(m.source, MatchSource::Array);
        assert_eq!(d.dispatch(Method::Post, "/health/").unwrap().handler, 2);
        assert_eq!(d.mode(), RouterMode::Array);
        assert_eq!(d.node_count(), 0);
    }

    #[test]
    fn test_second_dispatch_hits_cache() {
        let mut d = small(16);
        d.register(Method::Get, "/a", 7).unwrap();
        assert_eq!(d.dispatch(Method::Get, "/a").unwrap().source, MatchSource::Array);
        let again = d.dispatch(Method::Get, "/a?x=1").unwrap();
        assert_eq!(again.source, MatchSource::HotCache);
        assert_eq!(again.handler, 7);
        assert_eq!(d.cache_stats().hits, 1);
        assert_eq!(d.cache_stats().fills, 1);
    }

    #[test]
    fn test_param_pattern_forces_migration() {
        let mut d = small(16);
        d.register(Method::Get, "/about", 1).unwrap();
        d.register(Method::Get, "/users/:id", 2).unwrap();
        assert_eq!(d.mode(), RouterMode::Trie);
        assert_eq!(d.route_count(), 2);

        let m = d.dispatch(Method::Get, "/users/42").unwrap();
        assert_eq!(m.handler, 2);
        assert_eq!(m.param("id"), Some("42"));
        assert_eq!(m.source, MatchSource::Trie);
        assert_eq!(d.dispatch(Method::Get, "/about").unwrap().source, MatchSource::HashIndex);
    }

    #[test]
    fn test_parameterized_matches_are_not_cached() {
        let mut d = small(16);
        d.register(Method::Get, "/users/:id", 1).unwrap();
        d.dispatch(Method::Get, "/users/1").unwrap();
        d.dispatch(Method::Get, "/users/1").unwrap();
        assert!(d.hot_cache().is_empty());
    }

    #[test]
    fn test_threshold_migration() {
        let mut d = small(3);
        for (i, p) in ["/a", "/b", "/c"].iter().enumerate() {
            d.register(Method::Get, p, i as u32).unwrap();
        }
        assert_eq!(d.mode(), RouterMode::Array);
        d.register(Method::Get, "/d", 3).unwrap();
        assert_eq!(d.mode(), RouterMode::Trie);
        assert_eq!(d.dispatch(Method::Get, "/b").unwrap().handler, 1);
        assert_eq!(d.dispatch(Method::Get, "/d").unwrap().handler, 3);
    }

    #[test]
    fn test_duplicates_rejected_in_both_modes() {
        let mut d = small(16);
        d.register(Method::Get, "/a", 1).unwrap();
        assert!(matches!(
            d.register(Method::Get, "/a/", 2),
            Err(RouterError::DuplicateRoute { .. })
        ));
        d.register(Method::Get, "/u/:id", 3).unwrap();
        assert!(matches!(
            d.register(Method::Get, "/a", 4),
            Err(RouterError::DuplicateRoute { .. })
        ));
        assert_eq!(d.route_count(), 2);
        assert_eq!(d.dispatch(Method::Get, "/a").unwrap().handler, 1);
    }

    #[test]
    fn test_specific_method_beats_any() {
        let mut d = small(16);
        d.register_any("/x", 1).unwrap();
        d.register(Method::Get, "/x", 2).unwrap();
        assert_eq!(d.dispatch(Method::Get, "/x").unwrap().handler, 2);
        assert_eq!(d.dispatch(Method::Delete, "/x").unwrap().handler, 1);

        d.migrate().unwrap();
        assert_eq!(d.dispatch(Method::Get, "/x").unwrap().handler, 2);
        assert_eq!(d.dispatch(Method::Delete, "/x").unwrap().handler, 1);
    }

    #[test]
    fn test_overlay_longest_prefix_wins() {
        let mut d = small(16);
        d.register(Method::Get, "/static/app.js", 1).unwrap();
        d.register_static_overlay("/static", 10).unwrap();
        d.register_static_overlay("/static/img", 11).unwrap();

        let m = d.dispatch(Method::Get, "/static/app.js").unwrap();
        assert_eq!((m.handler, m.source), (10, MatchSource::StaticOverlay));
        assert_eq!(d.dispatch(Method::Get, "/static/img/a.png").unwrap().handler, 11);
        assert_eq!(d.dispatch(Method::Get, "/static").unwrap().handler, 10);
        assert!(d.dispatch(Method::Get, "/statically").is_err());
        assert!(matches!(
            d.register_static_overlay("/static/", 12),
            Err(RouterError::DuplicateRoute { .. })
        ));
    }

    #[test]
    fn test_overlay_registration_invalidates_cache() {
        let mut d = small(16);
        d.register(Method::Get, "/files/a", 1).unwrap();
        d.dispatch(Method::Get, "/files/a").unwrap();
        assert_eq!(d.hot_cache().len(), 1);
        d.register_static_overlay("/files", 2).unwrap();
        assert!(d.hot_cache().is_empty());
        assert_eq!(d.dispatch(Method::Get, "/files/a").unwrap().handler, 2);
    }

    #[test]
    fn test_fallback_and_not_found() {
        let mut d = small(16);
        d.register(Method::Get, "/a", 1).unwrap();
        assert_eq!(d.dispatch(Method::Get, "/nope"), Err(NotFound));
        d.register_fallback(99);
        let m = d.dispatch(Method::Get, "/nope").unwrap();
        assert_eq!((m.handler, m.source), (99, MatchSource::Fallback));
        assert!(m.params.is_empty());
    }

    #[test]
    fn test_oversized_path_policies() {
        let long = format!("/{}", "a".repeat(40));
        let mut d = Dispatcher::new(RouterConfig {
            max_path_len: 32,
            ..RouterConfig::default()
        });
        d.register(Method::Get, "/", 1).unwrap();
        assert_eq!(d.dispatch(Method::Get, &long).unwrap().handler, 1);

        let mut d = Dispatcher::new(RouterConfig {
            max_path_len: 32,
            oversized_path: OversizedPathPolicy::Reject,
            ..RouterConfig::default()
        });
        d.register(Method::Get, "/", 1).unwrap();
        d.register_fallback(2);
        assert_eq!(d.dispatch(Method::Get, &long), Err(NotFound));
        assert_eq!(d.dispatch(Method::Get, "").unwrap().handler, 1);
    }

    #[test]
    fn test_teardown_resets_everything() {
        let mut d = small(1);
        d.register(Method::Get, "/a", 1).unwrap();
        d.register(Method::Get, "/b/:id", 2).unwrap();
        d.register_static_overlay("/s", 3).unwrap();
        d.register_fallback(4);
        d.dispatch(Method::Get, "/a").unwrap();
        assert_eq!(d.mode(), RouterMode::Trie);

        d.teardown();
        assert_eq!(d.mode(), RouterMode::Array);
        assert_eq!(d.route_count(), 0);
        assert_eq!(d.node_count(), 0);
        assert_eq!(d.overlay_count(), 0);
        assert!(!d.has_fallback());
        assert!(d.hot_cache().is_empty());
        assert_eq!(d.dispatch(Method::Get, "/a"), Err(NotFound));

        d.register(Method::Get, "/a", 5).unwrap();
        assert_eq!(d.dispatch(Method::Get, "/a").unwrap().handler, 5);
    }

    #[test]
    fn test_covers() {
        assert!(covers("/", "/anything"));
        assert!(covers("/s", "/s"));
        assert!(covers("/s", "/s/x"));
        assert!(!covers("/s", "/sx"));
        assert!(!covers("/s/x", "/s"));
    }
}
