//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → rate_limit.rs (per-client sliding window, 429 on overflow)
//!     → headers.rs (hardening response headers)
//!     → auth.rs (bearer / API key, on protected routes only)
//!     → rest of the chain
//! ```
//!
//! # Design Decisions
//! - Every check is an ordinary chain element, composed per router or route
//! - Fail closed: reject on any security check failure
//! - No trust in client input

pub mod auth;
pub mod headers;
pub mod rate_limit;

pub use auth::{AuthStrategy, Principal, RequireAuth};
pub use headers::SecurityHeaders;
pub use rate_limit::{client_key, RateDecision, RateLimit, RateLimiter};
