use std::fmt;

/// Registration error
///
/// Returned by [`Router::register`](crate::router::Router::register) and the
/// verb shortcuts when a route cannot be added. The routing table is left
/// untouched whenever this error is returned.
#[derive(Debug)]
pub enum RouteError {
    /// The pattern is not a valid regular expression
    InvalidPattern {
        /// The pattern text as supplied by the caller
        pattern: String,
        /// Compiler diagnostic from the regex engine
        source: regex::Error,
    },
    /// The method string is not a valid HTTP token
    InvalidMethod {
        /// The method text as supplied by the caller
        method: String,
    },
}

impl fmt::Display for RouteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouteError::InvalidPattern { pattern, source } => {
                write!(f, "invalid route pattern '{pattern}': {source}")
            }
            RouteError::InvalidMethod { method } => {
                write!(f, "invalid HTTP method '{method}'")
            }
        }
    }
}

impl std::error::Error for RouteError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RouteError::InvalidPattern { source, .. } => Some(source),
            RouteError::InvalidMethod { .. } => None,
        }
    }
}
