//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Route declaration ("/users/:id")
//!     → pattern.rs (compile into segments, fail fast on bad input)
//!     → table.rs (append to ordered RouteTable)
//!
//! Incoming (method, path)
//!     → router.rs (local routes first, then mounts by longest prefix)
//!     → Return: params + middleware-prefixed chain, or None
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - No regex in hot path (segment comparison only)
//! - Deterministic: same input always matches same route
//! - First match wins (registration order, no specificity ranking)

pub mod pattern;
pub mod router;
pub mod table;

pub use pattern::{ParamMap, PathPattern, PatternError, Segment, WILDCARD_PARAM};
pub use router::{RouteInfo, Router};
pub use table::{MethodFilter, Route, RouteTable};
