//! # Server Module
//!
//! Glue between the routing core and the network.
//!
//! - [`Request`] is the inbound request as handlers see it: decoded path,
//!   query and form parameters, headers and cookies.
//! - [`ResponseSink`] is where responses are written. [`BufferedResponse`]
//!   keeps everything in memory until dispatch completes.
//! - [`Context`] bundles request, response and server for handlers that ask
//!   for it, with helpers such as `abort`, `redirect` and `set_cookie`.
//! - [`Server`] freezes a [`Router`](crate::router::Router) and runs the full
//!   pipeline for one request via [`Server::handle`], with or without a socket.
//! - [`AppService`] and [`HttpServer`] put a `Server` behind `may_minihttp`,
//!   one coroutine per connection.
//!
//! ## Transport limitations
//!
//! `may_minihttp` writes `Server`, `Date` and `Content-Length` itself; values
//! a handler sets for these are dropped when the response is flushed. The
//! body a GET handler produces for a HEAD request is discarded at flush.
//!
//! Header lines must be `&'static str`, so each distinct line is interned
//! once in a process-wide cache with a fixed capacity. When the cache is
//! full, lines not already in it are dropped with a WARN. A response also
//! carries at most 16 handler headers; the rest are dropped the same way.

mod context;
pub mod http_server;
pub mod request;
pub mod response;
mod service;

pub use context::{Context, Cookie};
pub use http_server::{HttpServer, ServerHandle};
pub use request::Request;
pub use response::{BufferedResponse, ResponseSink};
pub use service::{AppService, Server};
