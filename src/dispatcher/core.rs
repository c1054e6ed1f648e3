//! Dispatcher core module - the per-request hot path.
//!
//! `dispatch` resolves the route, runs the handler through `isolate`, and
//! hands the reply to the response resolver. Every fault is contained here,
//! so a bad handler costs one 500 response and nothing else.

use super::fault::Fault;
use super::panic_trace;
use crate::handler::Reply;
use crate::router::{RouteMatch, Router};
use crate::server::response::{resolve_reply, write_fixed};
use crate::server::Context;
use std::backtrace::Backtrace;
use std::panic::{self, AssertUnwindSafe};
use std::time::Instant;
use tracing::{debug, error};

/// Body sent when no route matches.
pub const NOT_FOUND_BODY: &str = "Page not found";

/// Body sent when a handler faults.
pub const SERVER_ERROR_BODY: &str = "Server Error";

/// How a dispatched request ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The handler's reply was written to the response
    Written,
    /// The handler returned nothing; the response is whatever it wrote itself
    Empty,
    /// No route matched; a 404 was written
    NotFound,
    /// The handler faulted; a 500 was written
    Failed,
}

/// Run one request through `router`.
///
/// Logging goes to the diagnostic sink configured on the context's server.
pub fn dispatch(router: &Router, ctx: &mut Context<'_>) -> DispatchOutcome {
    let diagnostics = ctx.server().diagnostics();
    diagnostics.in_scope(|| dispatch_in_scope(router, ctx))
}

fn dispatch_in_scope(router: &Router, ctx: &mut Context<'_>) -> DispatchOutcome {
    let request = ctx.request();

    let Some(matched) = router.resolve(&request.method, &request.path) else {
        debug!(
            request_id = %request.id,
            method = %request.method,
            path = %request.path,
            "No route matched"
        );
        write_fixed(ctx.response(), 404, NOT_FOUND_BODY);
        return DispatchOutcome::NotFound;
    };

    match isolate(&matched, ctx) {
        Err(_) => {
            write_fixed(ctx.response(), 500, SERVER_ERROR_BODY);
            DispatchOutcome::Failed
        }
        Ok(Reply::Empty) => DispatchOutcome::Empty,
        Ok(reply) => {
            resolve_reply(reply, ctx.response());
            DispatchOutcome::Written
        }
    }
}

/// Invoke the matched handler with fault containment.
///
/// A normal result is returned unchanged. Panics, arity and binding faults,
/// and handler errors are logged at ERROR together with a backtrace and
/// returned as `Err`; they never propagate further. A panic's backtrace is
/// the one recorded where it was raised. Anything the handler
/// wrote to the response before faulting stays written.
///
/// # Errors
///
/// Returns the [`Fault`] that ended the invocation.
pub fn isolate(matched: &RouteMatch, ctx: &mut Context<'_>) -> Result<Reply, Fault> {
    let route = &matched.route;
    let start = Instant::now();
    panic_trace::install_hook();
    panic_trace::clear();

    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        route.handler().invoke(ctx, &matched.captures)
    }));

    let fault = match outcome {
        Ok(Ok(reply)) => {
            debug!(
                request_id = %ctx.request().id,
                pattern = %route.pattern(),
                elapsed_us = start.elapsed().as_micros() as u64,
                "Handler execution complete"
            );
            return Ok(reply);
        }
        Ok(Err(fault)) => fault,
        Err(payload) => Fault::from_panic(payload),
    };

    let backtrace = match &fault {
        Fault::Panic { .. } => panic_trace::take().unwrap_or_else(Backtrace::capture),
        _ => Backtrace::capture(),
    };
    let request = ctx.request();
    error!(
        request_id = %request.id,
        method = %request.method,
        path = %request.path,
        pattern = %route.pattern(),
        captures = ?matched.captures,
        fault_kind = fault.kind(),
        fault = %fault,
        backtrace = %backtrace,
        "Handler crashed"
    );
    Err(fault)
}
