//! Chain elements and the `Next` continuation.
//!
//! # Design Decisions
//! - A chain is a flat slice of handlers; `Next` is an index into it
//! - `Next::run` consumes the continuation, so proceeding twice does not
//!   compile
//! - Proceeding past the terminal handler is a no-op

use std::cell::Cell;
use std::sync::Arc;

use crate::context::Context;
use crate::dispatch::error::HandlerResult;

/// A middleware or terminal route handler.
pub trait Handler: Send + Sync + 'static {
    fn call(&self, ctx: &mut Context, next: Next<'_>) -> HandlerResult;
}

impl<F> Handler for F
where
    F: Fn(&mut Context, Next<'_>) -> HandlerResult + Send + Sync + 'static,
{
    fn call(&self, ctx: &mut Context, next: Next<'_>) -> HandlerResult {
        self(ctx, next)
    }
}

/// Shared, type-erased chain element.
pub type BoxedHandler = Arc<dyn Handler>;

/// Box a closure as a chain element.
pub fn from_fn<F>(f: F) -> BoxedHandler
where
    F: Fn(&mut Context, Next<'_>) -> HandlerResult + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Box a terminal handler that never proceeds.
pub fn endpoint<F>(f: F) -> BoxedHandler
where
    F: Fn(&mut Context) -> HandlerResult + Send + Sync + 'static,
{
    Arc::new(Endpoint(f))
}

struct Endpoint<F>(F);

impl<F> Handler for Endpoint<F>
where
    F: Fn(&mut Context) -> HandlerResult + Send + Sync + 'static,
{
    fn call(&self, ctx: &mut Context, _next: Next<'_>) -> HandlerResult {
        (self.0)(ctx)
    }
}

/// Lifecycle of one dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchState {
    Pending,
    /// Element `i` of the chain has been entered.
    Running(usize),
    /// Chain exhausted, or an element returned without proceeding.
    Terminated,
    /// An error reached the dispatch boundary.
    Failed,
}

/// Continuation handed to each chain element.
pub struct Next<'a> {
    chain: &'a [BoxedHandler],
    index: usize,
    cursor: &'a Cell<DispatchState>,
}

impl<'a> Next<'a> {
    pub(crate) fn start(chain: &'a [BoxedHandler], cursor: &'a Cell<DispatchState>) -> Self {
        Self {
            chain,
            index: 0,
            cursor,
        }
    }

    /// Run the rest of the chain and return once it has finished
    /// (or stopped early).
    pub fn run(self, ctx: &mut Context) -> HandlerResult {
        let Some(handler) = self.chain.get(self.index) else {
            return Ok(());
        };
        self.cursor.set(DispatchState::Running(self.index));
        let next = Next {
            chain: self.chain,
            index: self.index + 1,
            cursor: self.cursor,
        };
        handler.call(ctx, next)
    }

    /// Number of elements that would run if this continuation is invoked.
    pub fn remaining(&self) -> usize {
        self.chain.len().saturating_sub(self.index)
    }

    pub fn is_terminal(&self) -> bool {
        self.remaining() == 0
    }
}

impl std::fmt::Debug for Next<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Next")
            .field("index", &self.index)
            .field("len", &self.chain.len())
            .finish()
    }
}
