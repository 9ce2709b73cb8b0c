//! Inbound request conversion.
//!
//! # Responsibilities
//! - Buffer the body up to the configured limit
//! - Build a [`Context`] from the Axum request parts
//! - Carry the peer address and request ID along
//!
//! # Design Decisions
//! - A declared `Content-Length` over the limit is rejected before reading
//! - Any failure while buffering answers 413; a broken stream has no client
//!   left to read the status

use std::net::SocketAddr;

use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::{header, Request as HttpRequest, StatusCode};

use crate::context::{Context, Request};

/// Header carrying the per-request correlation ID.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Request ID assigned by the transport, stored in the Context extensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestId(pub String);

/// Buffer `request` and turn it into a dispatchable Context.
pub async fn into_context(request: HttpRequest<Body>, max_body_size: usize) -> Result<Context, StatusCode> {
    let declared = request
        .headers()
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<usize>().ok());
    if declared.is_some_and(|len| len > max_body_size) {
        return Err(StatusCode::PAYLOAD_TOO_LARGE);
    }

    let (parts, body) = request.into_parts();
    let bytes = axum::body::to_bytes(body, max_body_size).await.map_err(|e| {
        tracing::debug!(error = %e, "Failed to buffer request body");
        StatusCode::PAYLOAD_TOO_LARGE
    })?;

    let target = parts
        .uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");
    let request_id = parts
        .headers
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let remote = parts
        .extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);

    let mut request = Request::new(parts.method, target, parts.headers, bytes);
    if let Some(addr) = remote {
        request = request.with_remote_addr(addr);
    }

    let mut ctx = Context::from_request(request);
    if let Some(id) = request_id {
        ctx.extensions_mut().insert(RequestId(id));
    }
    Ok(ctx)
}
