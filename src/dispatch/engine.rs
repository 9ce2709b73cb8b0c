//! Request dispatch.
//!
//! # Responsibilities
//! - Resolve the effective chain from the root router
//! - Bind path params into the Context
//! - Run the chain through the `Next` continuation
//! - Catch errors and panics once, at the outermost call, and hand them to
//!   the error stage
//!
//! # Design Decisions
//! - Dispatch is synchronous; the transport decides which thread runs it
//! - An unmatched path still runs the root router's middleware, followed by
//!   the not-found terminal
//! - A failing error stage is fatal for the request: the response becomes a
//!   bare 500 and nothing else runs
//! - Errors raised after `flush` keep the committed response untouched

use std::any::Any;
use std::cell::Cell;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;

use axum::http::StatusCode;
use serde_json::json;

use crate::context::{Context, Response};
use crate::dispatch::chain::{endpoint, BoxedHandler, DispatchState, Next};
use crate::dispatch::error::{HandlerError, HandlerResult};
use crate::observability::metrics;
use crate::routing::Router;

/// Converts a request-time error into a response.
///
/// The stage sees the error exactly once per request. It must not fail;
/// if it does, the request is answered with a bare 500.
pub trait ErrorStage: Send + Sync + 'static {
    fn handle(&self, err: &HandlerError, ctx: &mut Context) -> HandlerResult;
}

impl<F> ErrorStage for F
where
    F: Fn(&HandlerError, &mut Context) -> HandlerResult + Send + Sync + 'static,
{
    fn handle(&self, err: &HandlerError, ctx: &mut Context) -> HandlerResult {
        self(err, ctx)
    }
}

/// Summary of one dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchOutcome {
    /// `Terminated` or `Failed`.
    pub state: DispatchState,
    /// Whether a route matched (false means the not-found terminal ran).
    pub matched: bool,
    /// Number of chain elements entered.
    pub handlers_run: usize,
    pub chain_len: usize,
    /// Kind of the error that reached the boundary, if any.
    pub error_kind: Option<&'static str>,
}

/// Resolves and runs handler chains against a root router.
///
/// Shared across threads; each call to [`Dispatcher::dispatch`] works only on
/// the Context it is given.
pub struct Dispatcher {
    root: Arc<Router>,
    error_stage: Option<Arc<dyn ErrorStage>>,
    not_found: BoxedHandler,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("root", &self.root)
            .field("error_stage", &self.error_stage.is_some())
            .finish()
    }
}

impl Dispatcher {
    pub fn new(root: impl Into<Arc<Router>>) -> Self {
        Self {
            root: root.into(),
            error_stage: None,
            not_found: endpoint(default_not_found),
        }
    }

    pub fn with_error_stage(mut self, stage: impl ErrorStage) -> Self {
        self.error_stage = Some(Arc::new(stage));
        self
    }

    /// Replace the terminal used when no route matches.
    pub fn with_not_found(mut self, handler: BoxedHandler) -> Self {
        self.not_found = handler;
        self
    }

    pub fn router(&self) -> &Router {
        &self.root
    }

    /// Run the request held by `ctx` to completion.
    pub fn dispatch(&self, ctx: &mut Context) -> DispatchOutcome {
        let started = Instant::now();
        let method = ctx.method().clone();
        let path = ctx.path().to_string();
        let _span = tracing::debug_span!("dispatch", %method, %path).entered();

        let (matched, chain) = match self.root.resolve(&method, &path) {
            Some((params, chain)) => {
                ctx.request.set_params(params);
                (true, chain)
            }
            None => {
                tracing::debug!("No route matched");
                let mut chain = self.root.middleware().to_vec();
                chain.push(Arc::clone(&self.not_found));
                (false, chain)
            }
        };

        let cursor = Cell::new(DispatchState::Pending);
        let result = guarded(|| Next::start(&chain, &cursor).run(ctx));

        let handlers_run = match cursor.get() {
            DispatchState::Running(i) => i + 1,
            _ => 0,
        };

        let (state, error_kind) = match result {
            Ok(()) => (DispatchState::Terminated, None),
            Err(err) => {
                let kind = err.kind();
                self.fail(err, ctx);
                (DispatchState::Failed, Some(kind))
            }
        };

        metrics::record_dispatch(method.as_str(), ctx.response.status().as_u16(), matched, started);
        tracing::debug!(
            status = ctx.response.status().as_u16(),
            matched,
            handlers_run,
            chain_len = chain.len(),
            state = ?state,
            "Dispatch finished"
        );

        DispatchOutcome {
            state,
            matched,
            handlers_run,
            chain_len: chain.len(),
            error_kind,
        }
    }

    fn fail(&self, err: HandlerError, ctx: &mut Context) {
        let status = err.status();
        if status.is_server_error() {
            tracing::error!(error = %err, kind = err.kind(), "Request failed");
        } else {
            tracing::debug!(error = %err, kind = err.kind(), "Request rejected");
        }
        metrics::record_handler_error(err.kind());

        if ctx.response.is_sent() {
            tracing::warn!(error = %err, "Error raised after response was flushed; keeping committed response");
            return;
        }
        if ctx.response.reset().is_err() {
            return;
        }

        let Some(stage) = &self.error_stage else {
            write_default_error(&err, ctx);
            return;
        };

        match guarded(|| stage.handle(&err, ctx)) {
            Ok(()) => {}
            Err(stage_err) => {
                tracing::error!(
                    error = %err,
                    stage_error = %stage_err,
                    "Error stage failed; answering with bare 500"
                );
                metrics::record_handler_error("error_stage");
                ctx.response = Response::default();
                let _ = ctx.text(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error");
            }
        }
    }
}

/// Run `f`, converting a panic into [`HandlerError::Panic`].
fn guarded<F>(f: F) -> HandlerResult
where
    F: FnOnce() -> HandlerResult,
{
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(result) => result,
        Err(payload) => Err(HandlerError::Panic(panic_message(payload.as_ref()))),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

fn default_not_found(ctx: &mut Context) -> HandlerResult {
    let body = json!({
        "error": "Not Found",
        "message": format!("Cannot {} {}", ctx.method(), ctx.path()),
        "path": ctx.path(),
    });
    ctx.json(StatusCode::NOT_FOUND, &body)?;
    Ok(())
}

/// Generic response when no error stage is configured. The error message
/// never reaches the client.
fn write_default_error(err: &HandlerError, ctx: &mut Context) {
    let status = err.status();
    let reason = status.canonical_reason().unwrap_or("Error");
    if ctx.json(status, &json!({ "error": reason })).is_err() {
        ctx.response.write_body("Internal Server Error");
    }
}
