//! # Handler Module
//!
//! Handlers are ordinary Rust functions or closures. Their shape decides how
//! a matched route is invoked:
//!
//! - a function whose first parameter is `&mut Context` receives the
//!   per-request [`Context`] followed by the captures,
//! - any other function (including one with no parameters) receives the
//!   captures only.
//!
//! The decision is made once, when the function is converted into a
//! [`Handler`] at registration time, through the [`IntoHandler`] trait. There
//! is no runtime type inspection on the request path.
//!
//! ```rust
//! use pathmux::{router::Router, server::Context};
//!
//! fn hello(name: String) -> String {
//!     format!("hello {name}")
//! }
//!
//! fn whoami(ctx: &mut Context<'_>, id: u64) -> String {
//!     ctx.set_header("X-User", &id.to_string());
//!     format!("user {id}")
//! }
//!
//! let mut router = Router::new();
//! router.get("/hello/([^/]+)", hello).unwrap();
//! router.get("/user/([0-9]+)", whoami).unwrap();
//! ```
//!
//! Capture parameters implement [`FromCapture`]; return values implement
//! [`IntoReply`]. The number of captures supplied by a pattern is not checked
//! against the handler's arity at registration; a mismatch surfaces as
//! [`Fault::Arity`] when the route is invoked.

mod reply;

pub use reply::{IntoReply, Reply};

use crate::dispatcher::Fault;
use crate::server::Context;
use std::fmt;
use std::sync::Arc;

/// Erased signature of a handler that receives captures only.
pub type PlainFn = dyn Fn(&[String]) -> Result<Reply, Fault> + Send + Sync;

/// Erased signature of a handler that receives the request context first.
pub type ContextFn = dyn Fn(&mut Context<'_>, &[String]) -> Result<Reply, Fault> + Send + Sync;

/// A registered handler, in one of the supported shapes.
#[derive(Clone)]
pub enum Handler {
    /// Bound to captures only
    Plain {
        /// Number of captures the handler consumes
        arity: usize,
        /// Erased handler body
        call: Arc<PlainFn>,
    },
    /// Receives `&mut Context` before the captures
    Contextual {
        /// Number of captures the handler consumes (context excluded)
        arity: usize,
        /// Erased handler body
        call: Arc<ContextFn>,
    },
}

impl Handler {
    /// Build a plain handler from an already-erased function.
    ///
    /// `call` is only invoked with exactly `arity` captures.
    pub fn plain<F>(arity: usize, call: F) -> Self
    where
        F: Fn(&[String]) -> Result<Reply, Fault> + Send + Sync + 'static,
    {
        Handler::Plain {
            arity,
            call: Arc::new(call),
        }
    }

    /// Build a context-receiving handler from an already-erased function.
    ///
    /// `call` is only invoked with exactly `arity` captures.
    pub fn contextual<F>(arity: usize, call: F) -> Self
    where
        F: Fn(&mut Context<'_>, &[String]) -> Result<Reply, Fault> + Send + Sync + 'static,
    {
        Handler::Contextual {
            arity,
            call: Arc::new(call),
        }
    }

    /// Number of capture parameters the handler declares.
    #[must_use]
    pub fn arity(&self) -> usize {
        match self {
            Handler::Plain { arity, .. } | Handler::Contextual { arity, .. } => *arity,
        }
    }

    /// Whether the handler takes the request context as its first argument.
    #[must_use]
    pub fn wants_context(&self) -> bool {
        matches!(self, Handler::Contextual { .. })
    }

    /// Invoke the handler with `captures` bound positionally.
    ///
    /// # Errors
    ///
    /// - [`Fault::Arity`] when the capture count differs from the arity
    /// - [`Fault::Binding`] when a capture cannot be converted
    /// - [`Fault::Handler`] when the handler returns an error
    ///
    /// Panics raised by the handler are not caught here; see
    /// [`isolate`](crate::dispatcher::isolate).
    pub fn invoke(&self, ctx: &mut Context<'_>, captures: &[String]) -> Result<Reply, Fault> {
        let expected = self.arity();
        if captures.len() != expected {
            return Err(Fault::Arity {
                expected,
                supplied: captures.len(),
            });
        }
        match self {
            Handler::Plain { call, .. } => call(captures),
            Handler::Contextual { call, .. } => call(ctx, captures),
        }
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let shape = if self.wants_context() {
            "Contextual"
        } else {
            "Plain"
        };
        f.debug_struct("Handler")
            .field("shape", &shape)
            .field("arity", &self.arity())
            .finish()
    }
}

/// Conversion of a single capture into a handler parameter.
pub trait FromCapture: Sized {
    /// Parse `raw`; the error string ends up in [`Fault::Binding`].
    fn from_capture(raw: &str) -> Result<Self, String>;
}

impl FromCapture for String {
    fn from_capture(raw: &str) -> Result<Self, String> {
        Ok(raw.to_string())
    }
}

macro_rules! from_capture_via_from_str {
    ($($ty:ty),* $(,)?) => {
        $(
            impl FromCapture for $ty {
                fn from_capture(raw: &str) -> Result<Self, String> {
                    raw.parse::<$ty>().map_err(|e| e.to_string())
                }
            }
        )*
    };
}

from_capture_via_from_str!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64, bool, char);

fn bind<T: FromCapture>(captures: &[String], index: usize) -> Result<T, Fault> {
    let raw = captures.get(index).ok_or(Fault::Arity {
        expected: index + 1,
        supplied: captures.len(),
    })?;
    T::from_capture(raw).map_err(|reason| Fault::Binding {
        index,
        value: raw.clone(),
        reason,
    })
}

/// Marker for handlers bound to captures only.
pub struct Captures<T>(std::marker::PhantomData<T>);

/// Marker for handlers that take `&mut Context` first.
pub struct WithContext<T>(std::marker::PhantomData<T>);

/// Marker for values that already are a [`Handler`].
pub struct Prebuilt;

/// Conversion of a function or closure into a [`Handler`].
///
/// `Marker` only exists to keep the blanket implementations for the
/// different function shapes apart; callers never name it.
pub trait IntoHandler<Marker> {
    /// Perform the conversion.
    fn into_handler(self) -> Handler;
}

impl IntoHandler<Prebuilt> for Handler {
    fn into_handler(self) -> Handler {
        self
    }
}

macro_rules! impl_into_handler {
    ($arity:expr; $($ty:ident => $idx:tt),*) => {
        impl<F, R, $($ty,)*> IntoHandler<Captures<($($ty,)*)>> for F
        where
            F: Fn($($ty),*) -> R + Send + Sync + 'static,
            R: IntoReply,
            $($ty: FromCapture,)*
        {
            #[allow(non_snake_case, unused_variables)]
            fn into_handler(self) -> Handler {
                let f = self;
                Handler::plain($arity, move |captures: &[String]| {
                    $(let $ty = bind::<$ty>(captures, $idx)?;)*
                    f($($ty),*).into_reply()
                })
            }
        }

        impl<F, R, $($ty,)*> IntoHandler<WithContext<($($ty,)*)>> for F
        where
            F: Fn(&mut Context<'_>, $($ty),*) -> R + Send + Sync + 'static,
            R: IntoReply,
            $($ty: FromCapture,)*
        {
            #[allow(non_snake_case, unused_variables)]
            fn into_handler(self) -> Handler {
                let f = self;
                Handler::contextual($arity, move |ctx: &mut Context<'_>, captures: &[String]| {
                    $(let $ty = bind::<$ty>(captures, $idx)?;)*
                    f(ctx, $($ty),*).into_reply()
                })
            }
        }
    };
}

impl_into_handler!(0;);
impl_into_handler!(1; T1 => 0);
impl_into_handler!(2; T1 => 0, T2 => 1);
impl_into_handler!(3; T1 => 0, T2 => 1, T3 => 2);
impl_into_handler!(4; T1 => 0, T2 => 1, T3 => 2, T4 => 3);
impl_into_handler!(5; T1 => 0, T2 => 1, T3 => 2, T4 => 3, T5 => 4);
impl_into_handler!(6; T1 => 0, T2 => 1, T3 => 2, T4 => 3, T5 => 4, T6 => 5);
impl_into_handler!(7; T1 => 0, T2 => 1, T3 => 2, T4 => 3, T5 => 4, T6 => 5, T7 => 6);
impl_into_handler!(8; T1 => 0, T2 => 1, T3 => 2, T4 => 3, T5 => 4, T6 => 5, T7 => 6, T8 => 7);
