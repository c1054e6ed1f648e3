//! # Router Module
//!
//! The router holds the routing table and resolves incoming requests against
//! it using regular-expression patterns.
//!
//! ## Overview
//!
//! The router is responsible for:
//! - Compiling path patterns when routes are registered
//! - Keeping routes in registration order, which is also match priority
//! - Matching a request's method and path to the first acceptable route
//! - Extracting positional captures for the handler
//!
//! ## Matching Rules
//!
//! 1. Routes are tried in the order they were registered. The first match
//!    wins; there is no "most specific route" ranking.
//! 2. The verb must be equal to the route's verb, except that a HEAD request
//!    is served by a GET route.
//! 3. The pattern must match the **entire** path. `/foo` does not match
//!    `/foobar`; use `/foo.*` if a prefix match is wanted.
//! 4. Each parenthesized group becomes one capture, left to right.
//!
//! ## Example
//!
//! ```rust
//! use http::Method;
//! use pathmux::router::Router;
//!
//! fn hello(val: String) -> String {
//!     format!("hello {val}")
//! }
//!
//! let mut router = Router::new();
//! router.get("/(.*)", hello).unwrap();
//!
//! let matched = router.resolve(&Method::GET, "/anything/here").unwrap();
//! assert_eq!(matched.captures.as_slice(), ["anything/here".to_string()]);
//! assert!(router.resolve(&Method::POST, "/anything/here").is_none());
//! ```
//!
//! ## Performance
//!
//! Lookup is a linear scan, O(n) in the number of routes. Captures are kept
//! in a `SmallVec` so that patterns with up to eight groups do not allocate
//! a vector on the heap.

mod core;
pub mod pattern;

pub use core::{Route, RouteMatch, Router};
pub(crate) use core::parse_method;
pub use pattern::{CaptureVec, Pattern, MAX_INLINE_CAPTURES};
