//! Outbound response conversion.

use axum::body::Body;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response as HttpResponse};

use crate::context::Response;

/// Serialize the accumulated response for Axum.
pub fn into_http(response: Response) -> HttpResponse {
    let (status, headers, body) = response.into_parts();
    let mut out = HttpResponse::new(Body::from(body));
    *out.status_mut() = status;
    *out.headers_mut() = headers;
    out
}

/// Plain response used when the request never reached the dispatcher.
pub fn transport_error(status: StatusCode) -> HttpResponse {
    let reason = status.canonical_reason().unwrap_or("Error");
    (status, reason).into_response()
}
