use routex_dsa::Method;

use crate::config::RouterConfig;
use crate::dispatcher::Dispatcher;
use crate::error::RouterError;

#[derive(Debug, Clone)]
enum Registration<H> {
    Route { method: Method, pattern: String, handler: H },
    Overlay { prefix: String, handler: H },
    Fallback(H),
}

/// A recorded route table that can be replayed into any number of dispatchers.
///
/// ## Thread-per-core
/// A [`Dispatcher`] never leaves the thread that built it. The registry is
/// plain data, so it is cloned into each worker, which then builds its own
/// dispatcher. Registrations replay in the order they were recorded, so the
/// migration point is identical on every worker.
#[derive(Debug, Clone)]
pub struct RouteRegistry<H> {
    entries: Vec<Registration<H>>,
}

impl<H> Default for RouteRegistry<H> {
    fn default() -> Self {
        Self { entries: Vec::new() }
    }
}

impl<H: Clone> RouteRegistry<H> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(&mut self, method: Method, pattern: &str, handler: H) {
        self.entries.push(Registration::Route {
            method,
            pattern: pattern.to_string(),
            handler,
        });
    }

    pub fn static_overlay(&mut self, prefix: &str, handler: H) {
        self.entries.push(Registration::Overlay {
            prefix: prefix.to_string(),
            handler,
        });
    }

    pub fn fallback(&mut self, handler: H) {
        self.entries.push(Registration::Fallback(handler));
    }

    /// Replays every registration into a fresh dispatcher.
    ///
    /// The first failing registration is returned; nothing is partially built.
    pub fn build(&self, config: &RouterConfig) -> Result<Dispatcher<H>, RouterError> {
        let mut dispatcher = Dispatcher::new(config.clone());
        for entry in &self.entries {
            match entry {
                Registration::Route { method, pattern, handler } => {
                    dispatcher.register(*method, pattern, handler.clone())?
                }
                Registration::Overlay { prefix, handler } => {
                    dispatcher.register_static_overlay(prefix, handler.clone())?
                }
                Registration::Fallback(handler) => dispatcher.register_fallback(handler.clone()),
            }
        }
        Ok(dispatcher)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatcher::RouterMode;

    #[test]
    fn test_replay_builds_independent_dispatchers() {
        let mut registry = RouteRegistry::new();
        registry.route(Method::Get, "/users/:id", 1u32);
        registry.static_overlay("/assets", 2);
        registry.fallback(3);

        let mut a = registry.build(&RouterConfig::default()).unwrap();
        let b = registry.build(&RouterConfig::default()).unwrap();
        assert_eq!(a.mode(), RouterMode::Trie);
        assert_eq!(a.dispatch(Method::Get, "/users/9").unwrap().param("id"), Some("9"));
        assert_eq!(a.dispatch(Method::Get, "/assets/x.css").unwrap().handler, 2);
        assert_eq!(a.dispatch(Method::Get, "/zzz").unwrap().handler, 3);
        assert_eq!(b.route_count(), 1);
        assert!(b.hot_cache().is_empty());
    }

    #[test]
    fn test_build_surfaces_first_error() {
        let mut registry = RouteRegistry::new();
        registry.route(Method::Get, "/a", 1u32);
        registry.route(Method::Get, "/a", 2);
        let err = registry.build(&RouterConfig::default()).unwrap_err();
        assert!(matches!(err, RouterError::DuplicateRoute { .. }));
    }
}
