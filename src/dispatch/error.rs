//! Request-time error taxonomy.

use axum::http::StatusCode;
use thiserror::Error;

use crate::context::{BodyError, ResponseError};

/// Result returned by every chain element.
pub type HandlerResult = Result<(), HandlerError>;

/// Any failure raised by a chain element while processing a request.
///
/// Propagates with `?` through `next.run(ctx)?` until either a middleware
/// intercepts it or it reaches the dispatch boundary and the error stage.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// Application error carrying the status it should surface as.
    #[error("{message}")]
    Status { status: StatusCode, message: String },

    /// Response state was mutated after flush.
    #[error(transparent)]
    Response(#[from] ResponseError),

    /// The request body could not be read as requested.
    #[error(transparent)]
    Body(#[from] BodyError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A chain element panicked; caught at the dispatch boundary.
    #[error("handler panicked: {0}")]
    Panic(String),

    #[error(transparent)]
    Other(Box<dyn std::error::Error + Send + Sync>),
}

impl HandlerError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self::Status {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    pub fn other<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Other(Box::new(err))
    }

    /// Status this error should surface as.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Status { status, .. } => *status,
            Self::Body(_) => StatusCode::BAD_REQUEST,
            Self::Response(_)
            | Self::Io(_)
            | Self::Json(_)
            | Self::Panic(_)
            | Self::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Short label used in logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Status { .. } => "status",
            Self::Response(_) => "response",
            Self::Body(_) => "body",
            Self::Io(_) => "io",
            Self::Json(_) => "json",
            Self::Panic(_) => "panic",
            Self::Other(_) => "other",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(HandlerError::not_found("x").status(), StatusCode::NOT_FOUND);
        assert_eq!(
            HandlerError::from(BodyError::Malformed("eof".into())).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            HandlerError::from(ResponseError::AlreadySent).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(HandlerError::Panic("boom".into()).to_string(), "handler panicked: boom");
    }
}
