use crate::ids::RequestId;
use http::Method;
use smallvec::SmallVec;
use std::borrow::Cow;
use std::io::{self, Read};
use tracing::debug;

/// Maximum inline query parameters before heap allocation.
pub const MAX_INLINE_PARAMS: usize = 8;

/// Name/value pairs in the order they appeared on the wire.
pub type ParamVec = SmallVec<[(String, String); MAX_INLINE_PARAMS]>;

/// Header name used to propagate request ids.
pub const REQUEST_ID_HEADER: &str = "X-Request-Id";

/// The inbound request as seen by handlers.
#[derive(Debug, Clone)]
pub struct Request {
    /// Correlation id, taken from `X-Request-Id` when it holds a valid ULID
    pub id: RequestId,
    /// HTTP method
    pub method: Method,
    /// Percent-decoded path, query string excluded
    pub path: String,
    /// Raw query string without the leading `?`
    pub query: String,
    /// Decoded query parameters
    pub query_params: ParamVec,
    /// Headers with their original names
    pub headers: ParamVec,
    /// Cookies from the `Cookie` header
    pub cookies: ParamVec,
    /// Raw body bytes
    pub body: Vec<u8>,
}

impl Request {
    /// Build a request for `target`, an origin-form URI such as `/a/b?x=1`.
    #[must_use]
    pub fn new(method: Method, target: &str) -> Self {
        let (raw_path, query) = match target.split_once('?') {
            Some((p, q)) => (p, q),
            None => (target, ""),
        };
        Self {
            id: RequestId::new(),
            method,
            path: decode_path(raw_path),
            query: query.to_string(),
            query_params: parse_form(query.as_bytes()),
            headers: ParamVec::new(),
            cookies: ParamVec::new(),
            body: Vec::new(),
        }
    }

    /// Add a header. `Cookie` and `X-Request-Id` are interpreted as well.
    #[must_use]
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.push_header(name, value);
        self
    }

    /// Replace the body.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    fn push_header(&mut self, name: &str, value: &str) {
        if name.eq_ignore_ascii_case("cookie") {
            self.cookies.extend(parse_cookies(value));
        } else if name.eq_ignore_ascii_case(REQUEST_ID_HEADER) {
            if let Ok(id) = value.trim().parse() {
                self.id = id;
            }
        }
        self.headers.push((name.to_string(), value.to_string()));
    }

    /// First value of header `name` (case-insensitive).
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Value of cookie `name`.
    #[must_use]
    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.cookies
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// First value of query parameter `name`.
    #[must_use]
    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query_params
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Whether the body is a url-encoded form that should be merged into [`form`](Self::form).
    fn has_form_body(&self) -> bool {
        let body_method =
            self.method == Method::POST || self.method == Method::PUT || self.method == Method::PATCH;
        body_method
            && self
                .header("Content-Type")
                .and_then(|ct| ct.split(';').next())
                .is_some_and(|ct| ct.trim().eq_ignore_ascii_case("application/x-www-form-urlencoded"))
    }

    /// Form parameters: url-encoded body fields (POST, PUT, PATCH) followed by
    /// query parameters. Body fields come first and therefore take precedence
    /// in [`form_value`](Self::form_value).
    #[must_use]
    pub fn form(&self) -> ParamVec {
        let mut params = if self.has_form_body() {
            parse_form(&self.body)
        } else {
            ParamVec::new()
        };
        params.extend(self.query_params.iter().cloned());
        params
    }

    /// First form value for `name`; see [`form`](Self::form).
    #[must_use]
    pub fn form_value(&self, name: &str) -> Option<String> {
        self.form()
            .into_iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v)
    }

    /// Convert a `may_minihttp` request.
    ///
    /// # Errors
    ///
    /// Returns `InvalidData` for a method that is not a valid HTTP token, or
    /// the I/O error raised while reading the body.
    pub fn from_minihttp(req: may_minihttp::Request) -> io::Result<Self> {
        let method = Method::from_bytes(req.method().as_bytes())
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        let mut request = Request::new(method, req.path());
        for h in req.headers() {
            request.push_header(h.name, &String::from_utf8_lossy(h.value));
        }

        let mut body = Vec::new();
        req.body().read_to_end(&mut body)?;
        request.body = body;

        debug!(
            request_id = %request.id,
            method = %request.method,
            path = %request.path,
            headers_count = request.headers.len(),
            body_bytes = request.body.len(),
            "Request parsed"
        );
        Ok(request)
    }
}

fn decode_path(raw: &str) -> String {
    match urlencoding::decode(raw) {
        Ok(Cow::Borrowed(p)) => p.to_string(),
        Ok(Cow::Owned(p)) => p,
        Err(_) => String::from_utf8_lossy(&urlencoding::decode_binary(raw.as_bytes())).into_owned(),
    }
}

fn parse_form(input: &[u8]) -> ParamVec {
    url::form_urlencoded::parse(input)
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect()
}

fn parse_cookies(header: &str) -> impl Iterator<Item = (String, String)> + '_ {
    header.split(';').filter_map(|pair| {
        let mut parts = pair.trim().splitn(2, '=');
        let name = parts.next()?.trim();
        if name.is_empty() {
            return None;
        }
        let value = parts.next().unwrap_or("").trim();
        Some((name.to_string(), value.to_string()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_split_and_decode() {
        let req = Request::new(Method::GET, "/caf%C3%A9/a%20b?limit=10&q=x%20y");
        assert_eq!(req.path, "/café/a b");
        assert_eq!(req.query, "limit=10&q=x%20y");
        assert_eq!(req.query_param("limit"), Some("10"));
        assert_eq!(req.query_param("q"), Some("x y"));
        assert_eq!(req.query_param("missing"), None);
    }

    #[test]
    fn test_first_query_value_wins() {
        let req = Request::new(Method::GET, "/?a=1&a=2");
        assert_eq!(req.query_param("a"), Some("1"));
    }

    #[test]
    fn test_headers_and_cookies() {
        let req = Request::new(Method::GET, "/")
            .with_header("Content-Type", "text/plain")
            .with_header("Cookie", "session=abc; theme=dark; =skip");
        assert_eq!(req.header("content-type"), Some("text/plain"));
        assert_eq!(req.cookie("session"), Some("abc"));
        assert_eq!(req.cookie("theme"), Some("dark"));
        assert_eq!(req.cookies.len(), 2);
    }

    #[test]
    fn test_request_id_header_is_honoured() {
        let id = RequestId::new();
        let req = Request::new(Method::GET, "/").with_header("x-request-id", &id.to_string());
        assert_eq!(req.id, id);

        let req = Request::new(Method::GET, "/").with_header("X-Request-Id", "not-a-ulid");
        assert_ne!(req.id.to_string(), "not-a-ulid");
    }

    #[test]
    fn test_form_body_takes_precedence() {
        let req = Request::new(Method::POST, "/submit?name=query&page=2")
            .with_header("Content-Type", "application/x-www-form-urlencoded; charset=utf-8")
            .with_body("name=body+value");
        assert_eq!(req.form_value("name").as_deref(), Some("body value"));
        assert_eq!(req.form_value("page").as_deref(), Some("2"));
    }

    #[test]
    fn test_form_body_ignored_for_get() {
        let req = Request::new(Method::GET, "/?x=1")
            .with_header("Content-Type", "application/x-www-form-urlencoded")
            .with_body("x=2");
        assert_eq!(req.form_value("x").as_deref(), Some("1"));
    }
}
