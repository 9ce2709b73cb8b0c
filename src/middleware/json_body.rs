//! Eager JSON body validation.

use axum::http::StatusCode;
use serde_json::json;

use crate::context::{BodyError, Context};
use crate::dispatch::{Handler, HandlerResult, Next};

/// Parses JSON bodies up front and stops the chain with `400` when the body
/// claims to be JSON but is not. Other bodies pass through untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonBody;

impl Handler for JsonBody {
    fn call(&self, ctx: &mut Context, next: Next<'_>) -> HandlerResult {
        let malformed = match ctx.request.body().as_json() {
            Err(BodyError::Malformed(reason)) => Some(reason),
            _ => None,
        };

        match malformed {
            Some(reason) => {
                tracing::debug!(path = %ctx.path(), %reason, "Rejected malformed JSON body");
                ctx.json(
                    StatusCode::BAD_REQUEST,
                    &json!({ "error": "Invalid JSON", "message": reason }),
                )?;
                Ok(())
            }
            None => next.run(ctx),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::{endpoint, BoxedHandler, Dispatcher};
    use crate::routing::Router;
    use axum::body::Bytes;
    use axum::http::{HeaderMap, HeaderValue, Method};
    use std::sync::Arc;

    fn run(body: &'static str, content_type: &'static str) -> Context {
        let guard: BoxedHandler = Arc::new(JsonBody);
        let mut router = Router::new();
        router
            .register(
                Method::POST,
                "/echo",
                vec![
                    guard,
                    endpoint(|ctx| {
                        let parsed = ctx.request.body().is_parsed();
                        ctx.text(StatusCode::OK, format!("parsed={parsed}"))?;
                        Ok(())
                    }),
                ],
            )
            .unwrap();

        let mut headers = HeaderMap::new();
        headers.insert("content-type", HeaderValue::from_static(content_type));
        let mut ctx = Context::new(Method::POST, "/echo", headers, Bytes::from_static(body.as_bytes()));
        Dispatcher::new(router).dispatch(&mut ctx);
        ctx
    }

    #[test]
    fn test_valid_json_is_parsed_before_handler() {
        let ctx = run(r#"{"a":1}"#, "application/json");
        assert_eq!(ctx.response.status(), StatusCode::OK);
        assert_eq!(ctx.response.body(), b"parsed=true");
    }

    #[test]
    fn test_invalid_json_stops_chain() {
        let ctx = run("{oops", "application/json");
        assert_eq!(ctx.response.status(), StatusCode::BAD_REQUEST);
        let body: serde_json::Value = serde_json::from_slice(ctx.response.body()).unwrap();
        assert_eq!(body["error"], "Invalid JSON");
    }

    #[test]
    fn test_non_json_passes_through() {
        let ctx = run("{oops", "text/plain");
        assert_eq!(ctx.response.status(), StatusCode::OK);
    }
}
