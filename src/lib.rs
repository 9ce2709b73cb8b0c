//! Express-style routing and middleware dispatch.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ http (axum transport, request ID, timeout)
//!                         │  builds Context
//!                         ▼
//!                     dispatch::Dispatcher
//!                         │  resolve (method, path) through routing::Router
//!                         │  (local routes, then mounts by longest prefix)
//!                         ▼
//!                     chain: root mw → child mw → route mw → terminal
//!                         │  each element calls next.run(ctx) to proceed
//!                         ▼
//!                     error stage (once, at the boundary) if anything failed
//!                         │
//!     Client Response ◀───┘  Context response → HTTP response
//!
//!     Cross-cutting: config, observability, security, session, middleware
//! ```

// Core engine
pub mod context;
pub mod dispatch;
pub mod routing;

// Reusable chain elements
pub mod middleware;
pub mod security;
pub mod session;

// Process concerns
pub mod config;
pub mod http;
pub mod observability;

// Example application
pub mod demo;

pub use config::AppConfig;
pub use context::Context;
pub use dispatch::{
    endpoint, from_fn, BoxedHandler, DispatchOutcome, DispatchState, Dispatcher, ErrorStage,
    Handler, HandlerError, HandlerResult, Next,
};
pub use http::HttpServer;
pub use routing::{MethodFilter, PathPattern, PatternError, Router};
