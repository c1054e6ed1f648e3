use super::request::Request;
use super::response::ResponseSink;
use super::service::Server;
use std::fmt;
use std::io;
use tracing::warn;

/// Per-request state handed to context-receiving handlers.
///
/// A context borrows the response being built, the inbound request and the
/// server that accepted it. It lives exactly as long as one dispatch.
pub struct Context<'a> {
    response: &'a mut dyn ResponseSink,
    request: &'a Request,
    server: &'a Server,
}

impl<'a> Context<'a> {
    /// Bind a context to one request/response pair.
    pub fn new(response: &'a mut dyn ResponseSink, request: &'a Request, server: &'a Server) -> Self {
        Self {
            response,
            request,
            server,
        }
    }

    /// The inbound request.
    #[must_use]
    pub fn request(&self) -> &'a Request {
        self.request
    }

    /// The server that accepted the request.
    #[must_use]
    pub fn server(&self) -> &'a Server {
        self.server
    }

    /// The response under construction.
    pub fn response(&mut self) -> &mut dyn ResponseSink {
        &mut *self.response
    }

    /// Replace every value of response header `name`.
    pub fn set_header(&mut self, name: &str, value: &str) {
        self.response.set_header(name, value);
    }

    /// Append a value to response header `name`.
    pub fn add_header(&mut self, name: &str, value: &str) {
        self.response.add_header(name, value);
    }

    /// First value of response header `name`.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.response.header(name)
    }

    /// Write `content` to the response body. Failures are logged.
    pub fn write_str(&mut self, content: &str) {
        if let Err(e) = self.write_bytes(content.as_bytes()) {
            warn!(request_id = %self.request.id, error = %e, "Error during write");
        }
    }

    /// Write raw bytes to the response body.
    ///
    /// # Errors
    ///
    /// Propagates the sink's write error.
    pub fn write_bytes(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.response.write_body(bytes)
    }

    /// Set `status` and write `body`.
    pub fn abort(&mut self, status: u16, body: &str) {
        self.response.write_status(status);
        self.write_str(body);
    }

    /// Redirect to `url` with the given 3xx `status`.
    pub fn redirect(&mut self, status: u16, url: &str) {
        self.set_header("Location", url);
        self.abort(status, &format!("Redirecting to: {url}"));
    }

    /// Respond with 304 and no body.
    pub fn not_modified(&mut self) {
        self.response.write_status(304);
    }

    /// Respond with 404 and `message`.
    pub fn not_found(&mut self, message: &str) {
        self.abort(404, message);
    }

    /// Respond with 401.
    pub fn unauthorized(&mut self) {
        self.abort(401, "Unauthorized");
    }

    /// Respond with 403.
    pub fn forbidden(&mut self) {
        self.abort(403, "Forbidden");
    }

    /// Set `Content-Type` from a MIME type or a file extension.
    ///
    /// A value containing `/` is used verbatim. Otherwise it is treated as an
    /// extension, with or without the leading dot, and looked up in a small
    /// table. Returns `false` when the extension is unknown; the header is
    /// then left alone.
    pub fn content_type(&mut self, value: &str) -> bool {
        let mime = if value.contains('/') {
            value
        } else {
            match mime_for_extension(value) {
                Some(mime) => mime,
                None => return false,
            }
        };
        self.set_header("Content-Type", mime);
        true
    }

    /// Append a `Set-Cookie` header.
    pub fn set_cookie(&mut self, cookie: &Cookie) {
        self.add_header("Set-Cookie", &cookie.to_string());
    }
}

impl fmt::Debug for Context<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("request_id", &self.request.id)
            .field("method", &self.request.method)
            .field("path", &self.request.path)
            .finish_non_exhaustive()
    }
}

fn mime_for_extension(ext: &str) -> Option<&'static str> {
    let ext = ext.trim_start_matches('.').to_ascii_lowercase();
    let mime = match ext.as_str() {
        "html" | "htm" => "text/html; charset=utf-8",
        "txt" => "text/plain; charset=utf-8",
        "css" => "text/css; charset=utf-8",
        "js" => "application/javascript",
        "json" => "application/json",
        "xml" => "application/xml",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "ico" => "image/x-icon",
        "pdf" => "application/pdf",
        "wasm" => "application/wasm",
        _ => return None,
    };
    Some(mime)
}

/// A cookie to send with the response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cookie {
    /// Cookie name
    pub name: String,
    /// Cookie value, sent as-is
    pub value: String,
    /// Lifetime in seconds; session cookie when unset
    pub max_age: Option<u64>,
    /// Path attribute; `/` when unset
    pub path: Option<String>,
}

impl Cookie {
    /// A session cookie with path `/`.
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            max_age: None,
            path: None,
        }
    }

    /// Expire the cookie after `seconds`.
    #[must_use]
    pub fn with_max_age(mut self, seconds: u64) -> Self {
        self.max_age = Some(seconds);
        self
    }

    /// Restrict the cookie to `path`.
    #[must_use]
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }
}

impl fmt::Display for Cookie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.name, self.value)?;
        write!(f, "; Path={}", self.path.as_deref().unwrap_or("/"))?;
        if let Some(max_age) = self.max_age {
            write!(f, "; Max-Age={max_age}")?;
        }
        Ok(())
    }
}
