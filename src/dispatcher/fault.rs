use std::any::Any;
use std::fmt;

/// A failure raised while binding or running a handler.
///
/// Faults never reach the client: the dispatcher logs them and answers with
/// a generic 500 response.
#[derive(Debug)]
pub enum Fault {
    /// The pattern supplied a different number of captures than the handler declares
    Arity {
        /// Captures the handler declares (context excluded)
        expected: usize,
        /// Captures the matched pattern produced
        supplied: usize,
    },
    /// A capture could not be converted into the declared parameter type
    Binding {
        /// Zero-based capture position
        index: usize,
        /// The raw capture text
        value: String,
        /// Conversion error message
        reason: String,
    },
    /// The handler returned an error
    Handler(anyhow::Error),
    /// The handler panicked
    Panic {
        /// Panic payload rendered as text when possible
        message: String,
    },
}

impl Fault {
    /// Build a [`Fault::Panic`] from a `catch_unwind` payload.
    #[must_use]
    pub fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&'static str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "non-string panic payload".to_string()
        };
        Fault::Panic { message }
    }

    /// Short machine-friendly name for structured logs.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Fault::Arity { .. } => "arity",
            Fault::Binding { .. } => "binding",
            Fault::Handler(_) => "handler",
            Fault::Panic { .. } => "panic",
        }
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Fault::Arity { expected, supplied } => write!(
                f,
                "handler expects {expected} captured argument(s) but the pattern supplied {supplied}"
            ),
            Fault::Binding {
                index,
                value,
                reason,
            } => write!(f, "cannot bind capture {index} ('{value}'): {reason}"),
            Fault::Handler(err) => write!(f, "handler returned an error: {err:#}"),
            Fault::Panic { message } => write!(f, "handler panicked: {message}"),
        }
    }
}

impl std::error::Error for Fault {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Fault::Handler(err) => Some(&**err),
            _ => None,
        }
    }
}
