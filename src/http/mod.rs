//! HTTP transport subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, trace span, timeout)
//!     → request.rs (buffer body, build Context)
//!     → Dispatcher::dispatch (blocking pool)
//!     → response.rs (Context response → Axum response)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::{into_context, RequestId, X_REQUEST_ID};
pub use response::into_http;
pub use server::HttpServer;
