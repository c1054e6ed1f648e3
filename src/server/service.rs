use super::context::Context;
use super::http_server::{HttpServer, ServerHandle};
use super::request::Request;
use super::response::{status_reason, BufferedResponse};
use crate::dispatcher::dispatch;
use crate::logging::Diagnostics;
use crate::router::Router;
use crate::runtime_config::ServerConfig;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use http::Method;
use may_minihttp::{HttpService, Request as WireRequest, Response as WireResponse};
use once_cell::sync::Lazy;
use std::io;
use std::net::ToSocketAddrs;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn, Dispatch};

/// A frozen routing table plus the settings used to serve it.
///
/// The table is shared behind an `Arc` and never mutated, so any number of
/// coroutines can dispatch against it concurrently.
#[derive(Debug, Clone)]
pub struct Server {
    router: Arc<Router>,
    config: ServerConfig,
    diagnostics: Diagnostics,
}

impl Server {
    /// Freeze `router` into a server with default settings.
    #[must_use]
    pub fn new(router: Router) -> Self {
        Self::from_shared(Arc::new(router))
    }

    /// Serve an already shared routing table.
    #[must_use]
    pub fn from_shared(router: Arc<Router>) -> Self {
        Self {
            router,
            config: ServerConfig::default(),
            diagnostics: Diagnostics::default(),
        }
    }

    /// Replace the server settings.
    #[must_use]
    pub fn with_config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    /// Send this server's log events, fault reports included, to `dispatch`.
    #[must_use]
    pub fn with_diagnostics(mut self, dispatch: Dispatch) -> Self {
        self.diagnostics = Diagnostics::new(dispatch);
        self
    }

    /// The frozen routing table.
    #[must_use]
    pub fn router(&self) -> &Arc<Router> {
        &self.router
    }

    /// Settings this server runs with.
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Where this server's log events go.
    #[must_use]
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// Run `request` through the whole pipeline and return the response.
    #[must_use]
    pub fn handle(&self, request: &Request) -> BufferedResponse {
        let start = Instant::now();
        let mut response = BufferedResponse::new();
        let outcome = {
            let mut ctx = Context::new(&mut response, request, self);
            dispatch(&self.router, &mut ctx)
        };

        if self.config.log_requests {
            self.diagnostics.in_scope(|| {
                info!(
                    request_id = %request.id,
                    method = %request.method,
                    path = %request.path,
                    params = ?request.query_params,
                    status = response.status(),
                    outcome = ?outcome,
                    duration_us = start.elapsed().as_micros() as u64,
                    "Request served"
                );
            });
        }
        response
    }

    /// Apply the configured stack size and start serving on `addr`.
    ///
    /// # Errors
    ///
    /// Returns an error if `addr` is invalid or cannot be bound.
    pub fn start<A: ToSocketAddrs>(self, addr: A) -> io::Result<ServerHandle> {
        self.config.runtime().apply();
        self.router.dump_routes();
        HttpServer(AppService::new(Arc::new(self))).start(addr)
    }

    /// Start serving on the configured address.
    ///
    /// # Errors
    ///
    /// Returns an error if the address is invalid or cannot be bound.
    pub fn start_configured(self) -> io::Result<ServerHandle> {
        let addr = self.config.addr.clone();
        self.start(addr)
    }
}

/// Adapter between `may_minihttp` and [`Server`].
#[derive(Clone)]
pub struct AppService {
    /// The server each request is handed to
    pub server: Arc<Server>,
}

impl AppService {
    /// Wrap a shared server.
    #[must_use]
    pub fn new(server: Arc<Server>) -> Self {
        Self { server }
    }
}

impl HttpService for AppService {
    fn call(&mut self, req: WireRequest, res: &mut WireResponse) -> io::Result<()> {
        let request = match Request::from_minihttp(req) {
            Ok(request) => request,
            Err(e) => {
                warn!(error = %e, "Rejecting malformed request");
                res.status_code(400, status_reason(400));
                res.body_vec(status_reason(400).as_bytes().to_vec());
                return Ok(());
            }
        };
        let response = self.server.handle(&request);
        flush(response, &request.method, res);
        Ok(())
    }
}

/// Headers `may_minihttp` always writes itself.
const TRANSPORT_HEADERS: [&str; 3] = ["Content-Length", "Date", "Server"];

/// Header slots in a `may_minihttp` response; writing past them panics.
const MAX_RESPONSE_HEADERS: usize = 16;

/// Distinct header lines kept by the process-wide interner.
const MAX_INTERNED_HEADER_LINES: usize = 4096;

fn flush(response: BufferedResponse, method: &Method, res: &mut WireResponse) {
    let (status, headers, body) = response.into_parts();
    res.status_code(usize::from(status), status_reason(status));
    for line in wire_headers(&headers, &HEADER_LINES) {
        res.header(line);
    }
    if method != Method::HEAD {
        res.body_vec(body);
    }
}

/// Select and intern the header lines that go on the wire.
///
/// Transport-owned headers are skipped. Lines containing CR or LF, lines the
/// interner refuses, and anything past [`MAX_RESPONSE_HEADERS`] are dropped
/// with a WARN.
fn wire_headers(headers: &[(String, String)], lines: &HeaderLines) -> Vec<&'static str> {
    let mut out = Vec::with_capacity(headers.len().min(MAX_RESPONSE_HEADERS));
    for (name, value) in headers {
        if TRANSPORT_HEADERS
            .iter()
            .any(|h| h.eq_ignore_ascii_case(name))
        {
            continue;
        }
        if has_line_break(name) || has_line_break(value) {
            warn!(header = %name, "Dropping header containing a line break");
            continue;
        }
        if out.len() == MAX_RESPONSE_HEADERS {
            warn!(header = %name, limit = MAX_RESPONSE_HEADERS, "Dropping header over the response limit");
            continue;
        }
        match lines.intern(name, value) {
            Some(line) => out.push(line),
            None => warn!(
                header = %name,
                limit = lines.limit(),
                "Dropping header, interned header cache is full"
            ),
        }
    }
    out
}

fn has_line_break(s: &str) -> bool {
    s.contains(['\r', '\n'])
}

/// Rendered `Name: value` lines handed to the transport.
///
/// `may_minihttp` only accepts `&'static str` header lines, so each distinct
/// line is leaked once and reused afterwards. The number of leaked lines is
/// capped; once the cap is reached only lines already cached can be sent.
struct HeaderLines {
    lines: DashMap<String, &'static str>,
    leaked: AtomicUsize,
    limit: usize,
}

impl HeaderLines {
    fn with_limit(limit: usize) -> Self {
        Self {
            lines: DashMap::new(),
            leaked: AtomicUsize::new(0),
            limit,
        }
    }

    fn limit(&self) -> usize {
        self.limit
    }

    fn intern(&self, name: &str, value: &str) -> Option<&'static str> {
        let line = format!("{name}: {value}");
        if let Some(existing) = self.lines.get(&line) {
            return Some(*existing);
        }
        match self.lines.entry(line) {
            Entry::Occupied(entry) => Some(*entry.get()),
            Entry::Vacant(entry) => {
                let reserved = self
                    .leaked
                    .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| {
                        (n < self.limit).then_some(n + 1)
                    });
                if reserved.is_err() {
                    return None;
                }
                let leaked: &'static str = Box::leak(entry.key().clone().into_boxed_str());
                entry.insert(leaked);
                Some(leaked)
            }
        }
    }
}

static HEADER_LINES: Lazy<HeaderLines> =
    Lazy::new(|| HeaderLines::with_limit(MAX_INTERNED_HEADER_LINES));

#[cfg(test)]
mod tests {
    use super::*;
    use http::Method;

    fn hello(val: String) -> String {
        format!("hello {val}")
    }

    #[test]
    fn test_handle_runs_pipeline() {
        let mut router = Router::new();
        router.get("/(.*)", hello).unwrap();
        let server = Server::new(router);

        let res = server.handle(&Request::new(Method::GET, "/world"));
        assert_eq!(res.status(), 200);
        assert_eq!(res.body_text(), "hello world");

        let res = server.handle(&Request::new(Method::POST, "/world"));
        assert_eq!(res.status(), 404);
    }

    #[test]
    fn test_intern_reuses_allocation() {
        let lines = HeaderLines::with_limit(4);
        let a = lines.intern("X-Test", "one").unwrap();
        let b = lines.intern("X-Test", "one").unwrap();
        assert_eq!(a, "X-Test: one");
        assert!(std::ptr::eq(a, b));
    }

    #[test]
    fn test_intern_stops_leaking_at_limit() {
        let lines = HeaderLines::with_limit(2);
        assert!(lines.intern("X-Request-Path", "/user/1").is_some());
        assert!(lines.intern("X-Request-Path", "/user/2").is_some());
        assert_eq!(lines.intern("X-Request-Path", "/user/3"), None);
        assert_eq!(lines.intern("X-Request-Path", "/user/1"), Some("X-Request-Path: /user/1"));
        assert_eq!(lines.lines.len(), 2);
    }

    #[test]
    fn test_wire_headers_filters_and_caps() {
        let lines = HeaderLines::with_limit(64);
        let mut headers = vec![
            ("Content-Length".to_string(), "3".to_string()),
            ("Server".to_string(), "custom".to_string()),
            ("X-Evil".to_string(), "a\r\nSet-Cookie: x=1".to_string()),
        ];
        for i in 0..MAX_RESPONSE_HEADERS + 4 {
            headers.push((format!("X-Many-{i}"), "v".to_string()));
        }

        let out = wire_headers(&headers, &lines);
        assert_eq!(out.len(), MAX_RESPONSE_HEADERS);
        assert_eq!(out[0], "X-Many-0: v");
        assert!(out.iter().all(|l| l.starts_with("X-Many-")));
    }

    #[test]
    fn test_wire_headers_drops_lines_the_interner_refuses() {
        let lines = HeaderLines::with_limit(1);
        let headers = vec![
            ("X-Request-Path".to_string(), "/user/1".to_string()),
            ("X-Request-Path".to_string(), "/user/2".to_string()),
            ("X-Request-Path".to_string(), "/user/1".to_string()),
        ];
        let out = wire_headers(&headers, &lines);
        assert_eq!(out, vec!["X-Request-Path: /user/1", "X-Request-Path: /user/1"]);
    }

    #[test]
    fn test_line_breaks_detected() {
        assert!(has_line_break("a\r\nInjected: yes"));
        assert!(has_line_break("a\nb"));
        assert!(!has_line_break("plain"));
    }
}
