//! # routex
//!
//! Tiered HTTP route dispatch: static overlays, a hot-path cache, then an
//! array scan that migrates once to a segment trie with a hash index in
//! front of it. One router per thread; see `routex_transport` for the
//! thread-per-core server that hosts it.

pub use routex_core::{
    CacheStats, ConfigError, Dispatcher, MatchSource, Method, NotFound, OversizedPathPolicy, Params,
    PatternFault, RouteMatch, RouteRegistry, RouterConfig, RouterError, RouterMode, ServerBuilder,
    ServerConfig,
};
pub use routex_transport::{Handler, Request, Response, RoutexServer, ServerHandle, TransportError};

pub mod demo;
