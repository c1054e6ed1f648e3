//! # Default Router
//!
//! One process-wide routing table, for programs that just want to register
//! a few handlers and serve them:
//!
//! ```rust,no_run
//! fn hello(val: String) -> String {
//!     format!("hello {val}")
//! }
//!
//! pathmux::get("/(.*)", hello).unwrap();
//! pathmux::run("127.0.0.1:8080").unwrap();
//! ```
//!
//! Registration may happen at any time, from any thread. Each registration
//! publishes a new copy of the table with the route appended, so readers
//! never see a partially built table and never block writers. A server
//! started with [`run`] or [`serve`] takes a [`snapshot`] when it starts;
//! routes registered later are not served by it.
//!
//! Programs that need more than one table should build [`Router`] values
//! directly and serve them with [`Server`](crate::server::Server).

use crate::error::RouteError;
use crate::handler::IntoHandler;
use crate::router::{parse_method, Route, Router};
use crate::runtime_config::ServerConfig;
use crate::server::{Server, ServerHandle};
use anyhow::{Context as _, Result};
use arc_swap::ArcSwap;
use http::Method;
use once_cell::sync::Lazy;
use std::io;
use std::sync::Arc;
use tracing::info;

static DEFAULT_ROUTER: Lazy<ArcSwap<Router>> =
    Lazy::new(|| ArcSwap::from_pointee(Router::new()));

/// Register `handler` for `method` requests matching `pattern`.
///
/// # Errors
///
/// - [`RouteError::InvalidMethod`] if `method` is not a valid HTTP token
/// - [`RouteError::InvalidPattern`] if `pattern` does not compile
pub fn route<M, H: IntoHandler<M>>(pattern: &str, method: &str, handler: H) -> Result<(), RouteError> {
    let method = parse_method(method)?;
    add(pattern, method, handler)
}

/// Register a GET route.
///
/// # Errors
///
/// Returns [`RouteError::InvalidPattern`] if `pattern` does not compile.
pub fn get<M, H: IntoHandler<M>>(pattern: &str, handler: H) -> Result<(), RouteError> {
    add(pattern, Method::GET, handler)
}

/// Register a POST route.
///
/// # Errors
///
/// Returns [`RouteError::InvalidPattern`] if `pattern` does not compile.
pub fn post<M, H: IntoHandler<M>>(pattern: &str, handler: H) -> Result<(), RouteError> {
    add(pattern, Method::POST, handler)
}

/// Register a PUT route.
///
/// # Errors
///
/// Returns [`RouteError::InvalidPattern`] if `pattern` does not compile.
pub fn put<M, H: IntoHandler<M>>(pattern: &str, handler: H) -> Result<(), RouteError> {
    add(pattern, Method::PUT, handler)
}

/// Register a DELETE route.
///
/// # Errors
///
/// Returns [`RouteError::InvalidPattern`] if `pattern` does not compile.
pub fn delete<M, H: IntoHandler<M>>(pattern: &str, handler: H) -> Result<(), RouteError> {
    add(pattern, Method::DELETE, handler)
}

fn add<M, H: IntoHandler<M>>(pattern: &str, method: Method, handler: H) -> Result<(), RouteError> {
    let route = Arc::new(Route::new(pattern, method, handler.into_handler())?);
    DEFAULT_ROUTER.rcu(|current| {
        let mut next = Router::clone(current);
        next.push(Arc::clone(&route));
        next
    });
    Ok(())
}

/// The table as it is right now.
#[must_use]
pub fn snapshot() -> Arc<Router> {
    DEFAULT_ROUTER.load_full()
}

/// Serve a snapshot of the default table with `config`.
///
/// # Errors
///
/// Returns an error if the configured address is invalid or cannot be bound.
pub fn serve(config: ServerConfig) -> io::Result<ServerHandle> {
    let router = snapshot();
    info!(addr = %config.addr, routes_count = router.len(), "Serving default router");
    Server::from_shared(router).with_config(config).start_configured()
}

/// Serve the default table on `addr` until the server exits.
///
/// Other settings come from the environment; see
/// [`runtime_config`](crate::runtime_config).
///
/// # Errors
///
/// Fails if the address cannot be bound or the accept loop panics.
pub fn run(addr: &str) -> Result<()> {
    let mut config = ServerConfig::from_env();
    config.addr = addr.to_string();
    run_with_config(config)
}

/// Serve the default table with `config` until the server exits.
///
/// # Errors
///
/// Fails if the address cannot be bound or the accept loop panics.
pub fn run_with_config(config: ServerConfig) -> Result<()> {
    let addr = config.addr.clone();
    let handle = serve(config).with_context(|| format!("Failed to start server on {addr}"))?;
    handle
        .join()
        .map_err(|e| anyhow::anyhow!("Server on {addr} panicked: {e:?}"))
}
