use std::any::Any;
use std::fmt;
use std::sync::Arc;

use routex_core::Params;

use crate::http::{Request, Response};

/// Shared, read-only state handed to a handler on every call.
pub type Context = Arc<dyn Any + Send + Sync>;

pub type HandlerFn = fn(&Request, &Params<'_>, Option<&(dyn Any + Send + Sync)>) -> Response;

/// A route target: a plain function plus optional context.
///
/// Cloning is a pointer copy and a reference-count bump, so a handler can be
/// cloned into every worker's route table and into the hot-path cache.
#[derive(Clone)]
pub struct Handler {
    name: &'static str,
    func: HandlerFn,
    context: Option<Context>,
}

static_assertions::assert_impl_all!(Handler: Send, Sync, Clone);

impl Handler {
    pub fn new(name: &'static str, func: HandlerFn) -> Self {
        Self {
            name,
            func,
            context: None,
        }
    }

    pub fn with_context(name: &'static str, func: HandlerFn, context: Context) -> Self {
        Self {
            name,
            func,
            context: Some(context),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    #[inline]
    pub fn call(&self, request: &Request, params: &Params<'_>) -> Response {
        (self.func)(request, params, self.context.as_deref())
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handler")
            .field("name", &self.name)
            .field("context", &self.context.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use routex_core::Method;

    fn greet(_: &Request, params: &Params<'_>, ctx: Option<&(dyn Any + Send + Sync)>) -> Response {
        let greeting = ctx.and_then(|c| c.downcast_ref::<String>()).map_or("hello", |s| s.as_str());
        Response::ok(format!("{} {}", greeting, params.get("name").unwrap_or("world")))
    }

    fn request() -> Request {
        Request {
            method: Method::Get,
            target: "/hi".to_string(),
            headers: Vec::new(),
            body: Bytes::new(),
        }
    }

    #[test]
    fn test_call_without_context() {
        let h = Handler::new("greet", greet);
        let resp = h.call(&request(), &Params::new());
        assert_eq!(resp.body().as_ref(), b"hello world");
        assert_eq!(h.name(), "greet");
    }

    #[test]
    fn test_call_with_context() {
        let h = Handler::with_context("greet", greet, Arc::new("hey".to_string()));
        let resp = h.clone().call(&request(), &Params::new());
        assert_eq!(resp.body().as_ref(), b"hey world");
    }
}
