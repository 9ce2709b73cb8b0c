//! Reusable chain elements.
//!
//! Every item here is a plain [`Handler`](crate::dispatch::Handler) value
//! built by an explicit constructor and registered with
//! `Router::use_handler` or as part of a route chain. None of them keep
//! process-wide state; shared state (limiter, session store) is injected.

pub mod compression;
pub mod cors;
pub mod errors;
pub mod json_body;
pub mod logger;
pub mod static_files;
pub mod validate;

pub use compression::Compression;
pub use cors::Cors;
pub use errors::JsonErrorStage;
pub use json_body::JsonBody;
pub use logger::{RequestLogFormat, RequestLogger};
pub use static_files::{content_type_for, StaticFiles, StaticFilesError};
pub use validate::Validate;
