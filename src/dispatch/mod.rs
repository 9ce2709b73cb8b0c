//! Dispatch engine.
//!
//! # Data Flow
//! ```text
//! Context (method, path)
//!     → engine.rs (resolve chain from root Router, bind params)
//!     → chain.rs (Next continuation: element i runs, may call next.run)
//!     → on Err/panic: error stage (or generic 500)
//!     → DispatchOutcome (Terminated | Failed)
//! ```
//!
//! # Design Decisions
//! - One request is one sequential run of its chain
//! - `next.run(ctx)` returns only after the rest of the chain has finished,
//!   so middleware can act on the response afterwards
//! - Not calling `next` is the normal way to stop early

pub mod chain;
pub mod engine;
pub mod error;

pub use chain::{endpoint, from_fn, BoxedHandler, DispatchState, Handler, Next};
pub use engine::{DispatchOutcome, Dispatcher, ErrorStage};
pub use error::{HandlerError, HandlerResult};
