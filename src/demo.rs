//! The route table served by the `routex` binary and the demos.

use std::any::Any;

use routex_core::{Params, ServerBuilder};
use routex_transport::{Handler, Request, Response};

type Ctx<'a> = Option<&'a (dyn Any + Send + Sync)>;

fn index(_: &Request, _: &Params<'_>, _: Ctx<'_>) -> Response {
    Response::ok("routex\n")
}

fn health(_: &Request, _: &Params<'_>, _: Ctx<'_>) -> Response {
    Response::ok("{\"status\":\"ok\"}").with_content_type("application/json")
}

fn user_by_id(_: &Request, params: &Params<'_>, _: Ctx<'_>) -> Response {
    Response::ok(format!("user {}\n", params.get("id").unwrap_or_default()))
}

fn new_user_form(_: &Request, _: &Params<'_>, _: Ctx<'_>) -> Response {
    Response::ok("new user form\n")
}

fn user_post(_: &Request, params: &Params<'_>, _: Ctx<'_>) -> Response {
    Response::ok(format!(
        "user {} post {}\n",
        params.get("id").unwrap_or_default(),
        params.get("post").unwrap_or_default()
    ))
}

fn echo(request: &Request, _: &Params<'_>, _: Ctx<'_>) -> Response {
    let response = Response::ok(request.body.clone());
    match request.header("content-type") {
        Some(ct) if ct.starts_with("application/json") => response.with_content_type("application/json"),
        _ => response,
    }
}

fn search(request: &Request, _: &Params<'_>, _: Ctx<'_>) -> Response {
    Response::ok(format!("query {}\n", request.query().unwrap_or_default()))
}

fn static_files(request: &Request, _: &Params<'_>, _: Ctx<'_>) -> Response {
    Response::ok(format!("static {}\n", request.target))
}

/// `/`, `/health`, `/search`, `/users/new`, `/users/:id`,
/// `/users/:id/posts/:post`, `POST /echo` and a `/static` overlay.
pub fn routes() -> ServerBuilder<Handler> {
    ServerBuilder::new()
        .get("/", Handler::new("index", index))
        .get("/health", Handler::new("health", health))
        .get("/search", Handler::new("search", search))
        .get("/users/new", Handler::new("new_user_form", new_user_form))
        .get("/users/:id", Handler::new("user_by_id", user_by_id))
        .get("/users/:id/posts/:post", Handler::new("user_post", user_post))
        .post("/echo", Handler::new("echo", echo))
        .static_overlay("/static", Handler::new("static_files", static_files))
}
