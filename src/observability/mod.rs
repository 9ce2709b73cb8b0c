//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Dispatcher, middleware and transport produce:
//!     → logging.rs (structured log events via tracing)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → Log aggregation (stdout, pretty or JSON)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Structured logging (JSON) for machine parsing
//! - Request ID flows through the transport span into every event
//! - Metrics are cheap (atomic increments)

pub mod logging;
pub mod metrics;
