//! # Dispatcher Module
//!
//! The dispatcher composes the router, the handler invoker and the response
//! resolver into the per-request control flow:
//!
//! 1. [`Router::resolve`](crate::router::Router::resolve) finds the first
//!    route whose verb and pattern match; no match writes a 404.
//! 2. [`isolate`] invokes the handler inside `catch_unwind`. A panic, an
//!    arity or binding fault, or a handler error is logged with a backtrace
//!    and becomes a 500 with a generic body. For panics the backtrace is
//!    the one recorded by a panic hook at the point of the panic; the hook is
//!    installed on first use and chains to the previously installed hook.
//! 3. A successful reply is serialized by
//!    [`resolve_reply`](crate::server::response::resolve_reply); a handler
//!    that returned nothing keeps whatever it wrote itself.
//!
//! ## Error Handling
//!
//! Faults are isolated to the request that raised them. The serving process
//! and concurrently running requests are unaffected, and no fault detail is
//! ever exposed in a response body.
//!
//! Writes made by a handler before it faulted are not undone; the 500 status
//! and body are applied on top of them.

mod core;
mod fault;
mod panic_trace;

pub use core::{dispatch, isolate, DispatchOutcome, NOT_FOUND_BODY, SERVER_ERROR_BODY};
pub use fault::Fault;
