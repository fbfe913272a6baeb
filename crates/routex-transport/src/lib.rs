//! # routex-transport: Connection Layer
//!
//! Turns bytes on a socket into `dispatch` calls and handler results back
//! into HTTP/1.1 responses. One router per worker thread.

pub mod connection;
pub mod error;
pub mod handler;
pub mod http;
pub mod server;

pub use connection::{respond, serve_connection, LocalRouter, MAX_BODY};
pub use error::TransportError;
pub use handler::{Context, Handler, HandlerFn};
pub use http::{parse_head, HeadParse, Request, RequestHead, Response};
pub use server::{RoutexServer, ServerHandle};
