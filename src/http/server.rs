//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router that forwards every request to the dispatcher
//! - Wire up middleware (tracing, timeout, request ID)
//! - Bind server to listener with graceful shutdown
//!
//! # Design Decisions
//! - Dispatch is synchronous, so it runs on Tokio's blocking pool and never
//!   stalls the reactor
//! - On timeout the client gets 408 from the timeout layer; the blocking
//!   dispatch finishes in the background and its result is discarded

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    response::Response,
    routing::any,
    Router,
};
use tokio::net::TcpListener;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::ServerConfig;
use crate::dispatch::Dispatcher;
use crate::http::request::{into_context, X_REQUEST_ID};
use crate::http::response::{into_http, transport_error};

/// State shared by every Axum handler invocation.
#[derive(Clone)]
struct ServerState {
    dispatcher: Arc<Dispatcher>,
    max_body_size: usize,
}

/// HTTP transport in front of a [`Dispatcher`].
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    pub fn new(dispatcher: Arc<Dispatcher>, config: &ServerConfig) -> Self {
        let state = ServerState {
            dispatcher,
            max_body_size: config.max_body_size,
        };
        Self {
            router: Self::build_router(config, state),
        }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &ServerConfig, state: ServerState) -> Router {
        Router::new()
            .route("/{*path}", any(dispatch_handler))
            .route("/", any(dispatch_handler))
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(config.request_timeout_secs)))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                let request_id = request
                    .headers()
                    .get(X_REQUEST_ID)
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("unknown");
                tracing::info_span!(
                    "request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = %request_id,
                )
            }))
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// The fully layered Axum router.
    pub fn into_router(self) -> Router {
        self.router
    }

    /// Run the server until Ctrl+C.
    pub async fn run(self, listener: TcpListener) -> Result<(), std::io::Error> {
        self.run_until(listener, shutdown_signal()).await
    }

    /// Run the server until `shutdown` resolves, then drain in-flight
    /// requests.
    pub async fn run_until<F>(self, listener: TcpListener, shutdown: F) -> Result<(), std::io::Error>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Buffer the request, dispatch it on the blocking pool and serialize the
/// resulting response.
async fn dispatch_handler(State(state): State<ServerState>, request: Request<Body>) -> Response {
    let mut ctx = match into_context(request, state.max_body_size).await {
        Ok(ctx) => ctx,
        Err(status) => {
            tracing::warn!(status = status.as_u16(), "Rejected request before dispatch");
            return transport_error(status);
        }
    };

    let span = tracing::Span::current();
    let dispatcher = Arc::clone(&state.dispatcher);
    let joined = tokio::task::spawn_blocking(move || {
        let _entered = span.enter();
        dispatcher.dispatch(&mut ctx);
        ctx
    })
    .await;

    match joined {
        Ok(ctx) => into_http(ctx.response),
        Err(e) => {
            tracing::error!(error = %e, "Dispatch task failed");
            transport_error(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Wait for shutdown signal (Ctrl+C).
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to install Ctrl+C handler");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::Router as Routes;
    use axum::http::Method;
    use tower::ServiceExt;

    fn server(max_body_size: usize) -> Router {
        let mut routes = Routes::new();
        routes
            .post("/echo", |ctx, _next| {
                let raw = ctx.request.body().raw().to_vec();
                ctx.text(StatusCode::OK, raw)?;
                Ok(())
            })
            .unwrap();
        let config = ServerConfig {
            max_body_size,
            ..ServerConfig::default()
        };
        HttpServer::new(Arc::new(Dispatcher::new(routes)), &config).into_router()
    }

    #[tokio::test]
    async fn test_forwards_to_dispatcher_with_request_id() {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/echo")
            .body(Body::from("ping"))
            .unwrap();
        let response = server(1024).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key(X_REQUEST_ID));
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"ping");
    }

    #[tokio::test]
    async fn test_body_over_limit_never_reaches_dispatcher() {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/echo")
            .body(Body::from(vec![b'x'; 32]))
            .unwrap();
        let response = server(8).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn test_unmatched_path_gets_dispatcher_404() {
        let request = Request::builder().uri("/missing").body(Body::empty()).unwrap();
        let response = server(1024).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
