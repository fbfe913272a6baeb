pub mod array;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod pattern;
pub mod registry;
pub mod route;

pub use array::ArrayRouter;
pub use config::{ConfigError, OversizedPathPolicy, RouterConfig, ServerConfig};
pub use dispatcher::{Dispatcher, RouterMode};
pub use error::{NotFound, PatternFault, RouterError};
pub use registry::RouteRegistry;
pub use route::{MatchSource, RouteEntry, RouteMatch};
pub use routex_dsa::{CacheStats, Method, Params};

/// A fluent builder for a route table plus the server settings it runs under.
///
/// Registrations are recorded, not applied: each worker replays them into
/// its own [`Dispatcher`], and any registration error surfaces there.
#[derive(Debug, Clone)]
pub struct ServerBuilder<H> {
    pub registry: RouteRegistry<H>,
    pub config: ServerConfig,
}

impl<H: Clone> Default for ServerBuilder<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H: Clone> ServerBuilder<H> {
    pub fn new() -> Self {
        Self {
            registry: RouteRegistry::new(),
            config: ServerConfig::default(),
        }
    }

    pub fn route(mut self, method: Method, pattern: &str, handler: H) -> Self {
        self.registry.route(method, pattern, handler);
        self
    }

    pub fn get(self, pattern: &str, handler: H) -> Self {
        self.route(Method::Get, pattern, handler)
    }

    pub fn post(self, pattern: &str, handler: H) -> Self {
        self.route(Method::Post, pattern, handler)
    }

    /// Matches every method without a more specific registration.
    pub fn any(self, pattern: &str, handler: H) -> Self {
        self.route(Method::Any, pattern, handler)
    }

    pub fn static_overlay(mut self, prefix: &str, handler: H) -> Self {
        self.registry.static_overlay(prefix, handler);
        self
    }

    pub fn fallback(mut self, handler: H) -> Self {
        self.registry.fallback(handler);
        self
    }

    /// Overrides the default server configuration.
    pub fn with_config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_router_config(mut self, router: RouterConfig) -> Self {
        self.config.router = router;
        self
    }

    pub fn with_threads(mut self, threads: usize) -> Self {
        self.config.threads = threads;
        self
    }

    /// Builds a dispatcher for the calling thread.
    pub fn build_dispatcher(&self) -> Result<Dispatcher<H>, RouterError> {
        self.registry.build(&self.config.router)
    }
}
