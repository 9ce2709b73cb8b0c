//! Shared utilities for integration tests.
#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::body::Bytes;
use axum::http::{HeaderMap, HeaderName, HeaderValue, Method};
use tokio::net::TcpListener;
use tokio::sync::oneshot;

use expressway::config::AppConfig;
use expressway::demo::{build_dispatcher, Services};
use expressway::{Context, Dispatcher, HttpServer};

/// Build a Context for `method target` with optional headers and body.
pub fn request(method: Method, target: &str) -> ContextBuilder {
    ContextBuilder {
        method,
        target: target.to_string(),
        headers: HeaderMap::new(),
        body: Bytes::new(),
    }
}

pub struct ContextBuilder {
    method: Method,
    target: String,
    headers: HeaderMap,
    body: Bytes,
}

impl ContextBuilder {
    pub fn header(mut self, name: &'static str, value: &str) -> Self {
        self.headers.insert(
            HeaderName::from_static(name),
            HeaderValue::from_str(value).unwrap(),
        );
        self
    }

    pub fn json(self, body: &str) -> Self {
        let mut this = self.header("content-type", "application/json");
        this.body = Bytes::copy_from_slice(body.as_bytes());
        this
    }

    pub fn build(self) -> Context {
        Context::new(self.method, &self.target, self.headers, self.body)
    }

    /// Build and dispatch, returning the finished Context.
    pub fn send(self, dispatcher: &Dispatcher) -> Context {
        let mut ctx = self.build();
        dispatcher.dispatch(&mut ctx);
        ctx
    }
}

pub fn body_text(ctx: &Context) -> String {
    String::from_utf8(ctx.response.body().to_vec()).unwrap()
}

pub fn body_json(ctx: &Context) -> serde_json::Value {
    serde_json::from_slice(ctx.response.body()).unwrap()
}

/// Ordered record of which chain elements ran.
#[derive(Clone, Default)]
pub struct Trace(Arc<Mutex<Vec<String>>>);

impl Trace {
    pub fn push(&self, entry: impl Into<String>) {
        self.0.lock().unwrap().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

/// Handle to a demo server running on an ephemeral port.
pub struct TestServer {
    pub addr: SocketAddr,
    pub services: Services,
    shutdown: Option<oneshot::Sender<()>>,
    _static_root: tempfile::TempDir,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

/// Start the demo application on 127.0.0.1:0.
pub async fn start_demo_server(mut config: AppConfig) -> TestServer {
    let static_root = tempfile::tempdir().unwrap();
    config.static_files.root = static_root.path().display().to_string();

    let services = Services::from_config(&config);
    let dispatcher = Arc::new(build_dispatcher(&config, &services).unwrap());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = oneshot::channel::<()>();

    let server = HttpServer::new(dispatcher, &config.server);
    tokio::spawn(async move {
        let _ = server
            .run_until(listener, async {
                let _ = rx.await;
            })
            .await;
    });

    TestServer {
        addr,
        services,
        shutdown: Some(tx),
        _static_root: static_root,
    }
}

/// Client that does not follow redirects.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap()
}
