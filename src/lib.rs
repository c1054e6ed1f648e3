//! # pathmux
//!
//! **pathmux** is a small HTTP request router for Rust. Routes pair a verb
//! with a regular-expression path pattern; the first registered route that
//! accepts a request wins, and the pattern's groups are handed to the handler
//! as positional arguments.
//!
//! ## Overview
//!
//! - Handlers are plain functions. One whose first parameter is
//!   `&mut Context` also receives the request context.
//! - Patterns must match the whole path.
//! - A HEAD request is served by a GET route.
//! - A handler that panics or fails costs that request a 500 and nothing
//!   else; the fault is logged with a backtrace.
//! - Servers run on the `may` coroutine runtime through `may_minihttp`.
//!
//! ## Architecture
//!
//! - **[`router`]** - Route table, pattern compilation and first-match lookup
//! - **[`handler`]** - Conversion of functions into handlers, capture binding and replies
//! - **[`dispatcher`]** - Per-request pipeline and fault isolation
//! - **[`server`]** - Request, response and context types; `may_minihttp` transport
//! - **[`default_router`]** - Process-wide table behind [`get`], [`post`], [`run`], ...
//! - **[`logging`]** - `tracing` subscriber setup and per-server diagnostic sinks
//! - **[`runtime_config`]** - Environment and YAML configuration
//! - **[`cli`]** - The `pathmux` demo binary
//!
//! ## Example
//!
//! ```rust
//! use http::Method;
//! use pathmux::router::Router;
//! use pathmux::server::{Context, Request, Server};
//!
//! fn hello(val: String) -> String {
//!     format!("hello {val}")
//! }
//!
//! fn user(ctx: &mut Context<'_>, id: u64) -> String {
//!     ctx.content_type("txt");
//!     format!("user {id}")
//! }
//!
//! let mut router = Router::new();
//! router.get("/user/([0-9]+)", user).unwrap();
//! router.get("/(.*)", hello).unwrap();
//!
//! let server = Server::new(router);
//!
//! let res = server.handle(&Request::new(Method::GET, "/user/7"));
//! assert_eq!(res.body_text(), "user 7");
//! assert_eq!(res.header("Content-Type"), Some("text/plain; charset=utf-8"));
//!
//! let res = server.handle(&Request::new(Method::GET, "/world"));
//! assert_eq!(res.body_text(), "hello world");
//!
//! let res = server.handle(&Request::new(Method::DELETE, "/world"));
//! assert_eq!(res.status(), 404);
//! assert_eq!(res.body_text(), "Page not found");
//! ```
//!
//! To serve over TCP, call [`Server::start`](server::Server::start) with an
//! address, or register on the default router and call [`run`].

pub mod cli;
pub mod default_router;
pub mod dispatcher;
pub mod error;
pub mod handler;
pub mod ids;
pub mod logging;
pub mod router;
pub mod runtime_config;
pub mod server;

pub use default_router::{delete, get, post, put, route, run, run_with_config};
pub use error::RouteError;
pub use handler::{Handler, IntoHandler, Reply};
pub use router::Router;
pub use server::{Context, Request, Server};
