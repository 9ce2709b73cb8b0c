//! Request logging.

use std::time::Instant;

use serde_json::json;

use crate::context::Context;
use crate::dispatch::{Handler, HandlerResult, Next};
use crate::http::RequestId;

/// Amount of detail emitted per request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RequestLogFormat {
    /// Method, path, status and duration.
    #[default]
    Basic,
    /// Basic plus request headers and a body preview.
    Detailed,
    /// One serialized JSON record per request.
    Json,
}

const BODY_PREVIEW: usize = 200;

/// Logs each request after the rest of the chain has run.
#[derive(Debug, Clone, Default)]
pub struct RequestLogger {
    format: RequestLogFormat,
}

impl RequestLogger {
    pub fn new(format: RequestLogFormat) -> Self {
        Self { format }
    }
}

impl Handler for RequestLogger {
    fn call(&self, ctx: &mut Context, next: Next<'_>) -> HandlerResult {
        let started = Instant::now();
        let result = next.run(ctx);
        let duration_ms = started.elapsed().as_secs_f64() * 1000.0;
        let status = logged_status(&result, ctx);
        let failed = result.is_err();

        match self.format {
            RequestLogFormat::Basic => {
                tracing::info!(
                    method = %ctx.method(),
                    path = %ctx.path(),
                    status,
                    duration_ms,
                    failed,
                    "Request handled"
                );
            }
            RequestLogFormat::Detailed => {
                let body = ctx.request.body().raw();
                let preview = String::from_utf8_lossy(&body[..body.len().min(BODY_PREVIEW)]);
                tracing::info!(
                    method = %ctx.method(),
                    path = %ctx.path(),
                    query = ctx.request.raw_query().unwrap_or_default(),
                    headers = ?ctx.request.headers(),
                    body = %preview,
                    status,
                    response_headers = ?ctx.response.headers(),
                    duration_ms,
                    failed,
                    "Request handled"
                );
            }
            RequestLogFormat::Json => {
                let request_id = ctx.extensions().get::<RequestId>().map(|id| id.0.as_str());
                let record = json!({
                    "request_id": request_id,
                    "method": ctx.method().as_str(),
                    "path": ctx.path(),
                    "status": status,
                    "duration_ms": (duration_ms * 100.0).round() / 100.0,
                    "failed": failed,
                });
                tracing::info!(record = %record, "Request handled");
            }
        }

        result
    }
}

/// The status the client ends up with: a failed chain is answered by the
/// error stage with the error's status, not whatever the response held.
fn logged_status(result: &HandlerResult, ctx: &Context) -> u16 {
    match result {
        Err(err) => err.status().as_u16(),
        Ok(()) => ctx.response.status().as_u16(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::{Dispatcher, HandlerError};
    use crate::routing::Router;
    use axum::http::{Method, StatusCode};

    #[test]
    fn test_logging_leaves_outcome_untouched() {
        for format in [RequestLogFormat::Basic, RequestLogFormat::Detailed, RequestLogFormat::Json] {
            let mut router = Router::new();
            router.use_handler(RequestLogger::new(format));
            router
                .get("/ok", |ctx, _next| {
                    ctx.text(StatusCode::OK, "fine")?;
                    Ok(())
                })
                .unwrap()
                .get("/fail", |_ctx, _next| Err(HandlerError::bad_request("nope")))
                .unwrap();
            let dispatcher = Dispatcher::new(router);

            let mut ctx = Context::new(Method::GET, "/ok", Default::default(), Default::default());
            ctx.extensions_mut().insert(RequestId("abc".into()));
            dispatcher.dispatch(&mut ctx);
            assert_eq!(ctx.response.status(), StatusCode::OK);
            assert_eq!(ctx.response.body(), b"fine");

            let mut ctx = Context::new(Method::GET, "/fail", Default::default(), Default::default());
            dispatcher.dispatch(&mut ctx);
            assert_eq!(ctx.response.status(), StatusCode::BAD_REQUEST);
        }
    }

    #[test]
    fn test_logged_status_follows_the_error() {
        let mut ctx = Context::new(Method::GET, "/", Default::default(), Default::default());
        ctx.response.set_status(StatusCode::CREATED).unwrap();
        assert_eq!(logged_status(&Ok(()), &ctx), 201);

        // The response still reads 200 while the error has not been rendered yet.
        let ctx = Context::new(Method::GET, "/", Default::default(), Default::default());
        assert_eq!(logged_status(&Err(HandlerError::bad_request("nope")), &ctx), 400);
        assert_eq!(logged_status(&Err(HandlerError::not_found("gone")), &ctx), 404);
        assert_eq!(logged_status(&Err(HandlerError::internal("boom")), &ctx), 500);
    }
}
