//! Router core module - the routing table and first-match lookup.

use super::pattern::{CaptureVec, Pattern};
use crate::error::RouteError;
use crate::handler::{Handler, IntoHandler};
use http::Method;
use std::sync::Arc;
use tracing::{debug, info};

/// A registered (pattern, method, handler) entry.
///
/// Routes are immutable once built; the matcher is always compiled from the
/// pattern stored next to it.
#[derive(Debug)]
pub struct Route {
    pattern: String,
    matcher: Pattern,
    method: Method,
    handler: Handler,
}

impl Route {
    /// Compile `pattern` and build a route.
    ///
    /// # Errors
    ///
    /// Returns [`RouteError::InvalidPattern`] when the pattern does not compile.
    pub fn new(pattern: &str, method: Method, handler: Handler) -> Result<Self, RouteError> {
        let matcher = Pattern::compile(pattern)?;
        Ok(Self {
            pattern: pattern.to_string(),
            matcher,
            method,
            handler,
        })
    }

    /// Source text of the pattern.
    #[must_use]
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Compiled matcher.
    #[must_use]
    pub fn matcher(&self) -> &Pattern {
        &self.matcher
    }

    /// Verb this route was registered for.
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Handler bound to this route.
    #[must_use]
    pub fn handler(&self) -> &Handler {
        &self.handler
    }

    /// Whether a request made with `method` may be served by this route.
    ///
    /// Verbs must be equal, except that HEAD is accepted by GET routes.
    #[must_use]
    pub fn accepts(&self, method: &Method) -> bool {
        *method == self.method || (*method == Method::HEAD && self.method == Method::GET)
    }
}

/// Result of successfully matching a request to a route.
#[derive(Debug, Clone)]
pub struct RouteMatch {
    /// The matched route (shared with the routing table)
    pub route: Arc<Route>,
    /// Captured groups in declaration order
    pub captures: CaptureVec,
}

/// Ordered routing table.
///
/// Insertion order is priority order: the first route whose verb and
/// pattern both match wins, regardless of how specific later routes are.
/// Registering the same pattern twice creates two live entries, and the
/// earlier one shadows the later.
///
/// Cloning is cheap; clones share their routes.
#[derive(Debug, Clone, Default)]
pub struct Router {
    routes: Vec<Arc<Route>>,
}

impl Router {
    /// Create an empty routing table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for `method` requests whose path matches `pattern`.
    ///
    /// The pattern is compiled immediately. On error the table is unchanged.
    ///
    /// # Errors
    ///
    /// - [`RouteError::InvalidMethod`] if `method` is not a valid HTTP token
    /// - [`RouteError::InvalidPattern`] if `pattern` does not compile
    pub fn register<M, H>(
        &mut self,
        pattern: &str,
        method: &str,
        handler: H,
    ) -> Result<&mut Self, RouteError>
    where
        H: IntoHandler<M>,
    {
        let method = parse_method(method)?;
        self.add_route(pattern, method, handler)
    }

    /// Register a route for an already-parsed [`Method`].
    ///
    /// # Errors
    ///
    /// Returns [`RouteError::InvalidPattern`] if `pattern` does not compile.
    pub fn add_route<M, H>(
        &mut self,
        pattern: &str,
        method: Method,
        handler: H,
    ) -> Result<&mut Self, RouteError>
    where
        H: IntoHandler<M>,
    {
        let route = Route::new(pattern, method, handler.into_handler())?;
        self.push(Arc::new(route));
        Ok(self)
    }

    /// Register a GET route.
    ///
    /// # Errors
    ///
    /// Returns [`RouteError::InvalidPattern`] if `pattern` does not compile.
    pub fn get<M, H: IntoHandler<M>>(
        &mut self,
        pattern: &str,
        handler: H,
    ) -> Result<&mut Self, RouteError> {
        self.add_route(pattern, Method::GET, handler)
    }

    /// Register a POST route.
    ///
    /// # Errors
    ///
    /// Returns [`RouteError::InvalidPattern`] if `pattern` does not compile.
    pub fn post<M, H: IntoHandler<M>>(
        &mut self,
        pattern: &str,
        handler: H,
    ) -> Result<&mut Self, RouteError> {
        self.add_route(pattern, Method::POST, handler)
    }

    /// Register a PUT route.
    ///
    /// # Errors
    ///
    /// Returns [`RouteError::InvalidPattern`] if `pattern` does not compile.
    pub fn put<M, H: IntoHandler<M>>(
        &mut self,
        pattern: &str,
        handler: H,
    ) -> Result<&mut Self, RouteError> {
        self.add_route(pattern, Method::PUT, handler)
    }

    /// Register a DELETE route.
    ///
    /// # Errors
    ///
    /// Returns [`RouteError::InvalidPattern`] if `pattern` does not compile.
    pub fn delete<M, H: IntoHandler<M>>(
        &mut self,
        pattern: &str,
        handler: H,
    ) -> Result<&mut Self, RouteError> {
        self.add_route(pattern, Method::DELETE, handler)
    }

    pub(crate) fn push(&mut self, route: Arc<Route>) {
        debug!(
            method = %route.method(),
            pattern = %route.pattern(),
            handler = ?route.handler(),
            position = self.routes.len(),
            "Route registered"
        );
        self.routes.push(route);
    }

    /// Find the first route accepting `method` whose pattern fully matches `path`.
    ///
    /// Returns `None` when the scan exhausts the table. The lookup has no side
    /// effects: repeating it with the same arguments yields the same route
    /// and captures.
    #[must_use]
    pub fn resolve(&self, method: &Method, path: &str) -> Option<RouteMatch> {
        self.routes
            .iter()
            .filter(|route| route.accepts(method))
            .find_map(|route| {
                route.matcher().captures(path).map(|captures| RouteMatch {
                    route: Arc::clone(route),
                    captures,
                })
            })
            .inspect(|matched| {
                debug!(
                    method = %method,
                    path = %path,
                    pattern = %matched.route.pattern(),
                    captures = ?matched.captures,
                    "Route matched"
                );
            })
    }

    /// Number of registered routes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Whether no route has been registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Routes in priority order.
    pub fn routes(&self) -> impl Iterator<Item = &Arc<Route>> {
        self.routes.iter()
    }

    /// Log the routing table at INFO level.
    pub fn dump_routes(&self) {
        info!(routes_count = self.routes.len(), "Routing table");
        for (position, route) in self.routes.iter().enumerate() {
            info!(
                position,
                method = %route.method(),
                pattern = %route.pattern(),
                handler = ?route.handler(),
                "Route"
            );
        }
    }
}

/// Parse a caller-supplied verb. Extension methods are accepted as-is.
pub(crate) fn parse_method(method: &str) -> Result<Method, RouteError> {
    Method::from_bytes(method.as_bytes()).map_err(|_| RouteError::InvalidMethod {
        method: method.to_string(),
    })
}
