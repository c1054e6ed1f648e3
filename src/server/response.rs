use crate::handler::Reply;
use smallvec::SmallVec;
use std::io;
use tracing::warn;

/// Maximum inline headers before heap allocation.
pub const MAX_INLINE_HEADERS: usize = 16;

/// Header storage for buffered responses.
pub type HeaderVec = SmallVec<[(String, String); MAX_INLINE_HEADERS]>;

/// Content type used when a handler's reply does not set one.
pub const DEFAULT_CONTENT_TYPE: &str = "text/html; charset=utf-8";

/// Where a response is written.
///
/// The dispatcher only ever touches status, headers and body through this
/// trait; connection handling belongs to the transport.
pub trait ResponseSink {
    /// Set the status code.
    fn write_status(&mut self, status: u16);
    /// Replace every value of `name` with `value`.
    fn set_header(&mut self, name: &str, value: &str);
    /// Append a value for `name`, keeping existing ones.
    fn add_header(&mut self, name: &str, value: &str);
    /// First value of `name` (case-insensitive), if any.
    fn header(&self, name: &str) -> Option<&str>;
    /// Append `bytes` to the body.
    ///
    /// # Errors
    ///
    /// Returns an error when the bytes cannot be delivered.
    fn write_body(&mut self, bytes: &[u8]) -> io::Result<()>;
}

/// In-memory response, flushed to the transport once dispatch completes.
///
/// The status is not on the wire until the flush, so the last status
/// written wins. A response whose status was never written is a 200.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BufferedResponse {
    status: Option<u16>,
    headers: HeaderVec,
    body: Vec<u8>,
}

impl BufferedResponse {
    /// Create an empty response.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Status code, 200 unless one was written.
    #[must_use]
    pub fn status(&self) -> u16 {
        self.status.unwrap_or(200)
    }

    /// Whether a status was explicitly written.
    #[must_use]
    pub fn status_written(&self) -> bool {
        self.status.is_some()
    }

    /// First value of `name` (case-insensitive), if any.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Every value of `name` in insertion order.
    pub fn header_values<'s>(&'s self, name: &'s str) -> impl Iterator<Item = &'s str> + 's {
        self.headers
            .iter()
            .filter(move |(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// All headers in insertion order.
    #[must_use]
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// Body bytes written so far.
    #[must_use]
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Body as text, replacing invalid UTF-8.
    #[must_use]
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Split into status, headers and body.
    #[must_use]
    pub fn into_parts(self) -> (u16, HeaderVec, Vec<u8>) {
        (self.status(), self.headers, self.body)
    }
}

impl ResponseSink for BufferedResponse {
    fn write_status(&mut self, status: u16) {
        self.status = Some(status);
    }

    fn set_header(&mut self, name: &str, value: &str) {
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        self.headers.push((name.to_string(), value.to_string()));
    }

    fn add_header(&mut self, name: &str, value: &str) {
        self.headers.push((name.to_string(), value.to_string()));
    }

    fn header(&self, name: &str) -> Option<&str> {
        BufferedResponse::header(self, name)
    }

    fn write_body(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.body.extend_from_slice(bytes);
        Ok(())
    }
}

/// Write a handler's reply to `sink`.
///
/// [`Reply::Empty`] writes nothing at all. Otherwise the content type
/// defaults to [`DEFAULT_CONTENT_TYPE`] when unset, `Content-Length` is set
/// to the body size and the bytes are written. A failing write is logged
/// and dropped.
pub fn resolve_reply(reply: Reply, sink: &mut dyn ResponseSink) {
    let Some(content) = reply.into_bytes() else {
        return;
    };
    if sink.header("Content-Type").is_none() {
        sink.set_header("Content-Type", DEFAULT_CONTENT_TYPE);
    }
    sink.set_header("Content-Length", &content.len().to_string());
    if let Err(e) = sink.write_body(&content) {
        warn!(error = %e, bytes = content.len(), "Error during write");
    }
}

/// Write a fixed status and plain body, as used for 404 and 500.
pub fn write_fixed(sink: &mut dyn ResponseSink, status: u16, body: &str) {
    sink.write_status(status);
    if let Err(e) = sink.write_body(body.as_bytes()) {
        warn!(error = %e, status, "Error during write");
    }
}

/// Canonical reason phrase for `status`.
#[must_use]
pub fn status_reason(status: u16) -> &'static str {
    match status {
        100 => "Continue",
        101 => "Switching Protocols",
        200 => "OK",
        201 => "Created",
        202 => "Accepted",
        204 => "No Content",
        206 => "Partial Content",
        301 => "Moved Permanently",
        302 => "Found",
        303 => "See Other",
        304 => "Not Modified",
        307 => "Temporary Redirect",
        308 => "Permanent Redirect",
        400 => "Bad Request",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        405 => "Method Not Allowed",
        409 => "Conflict",
        410 => "Gone",
        413 => "Payload Too Large",
        415 => "Unsupported Media Type",
        422 => "Unprocessable Entity",
        429 => "Too Many Requests",
        500 => "Internal Server Error",
        501 => "Not Implemented",
        502 => "Bad Gateway",
        503 => "Service Unavailable",
        504 => "Gateway Timeout",
        _ => "Unknown",
    }
}
