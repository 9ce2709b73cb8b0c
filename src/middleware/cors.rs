//! Cross-origin resource sharing headers.

use axum::http::{Method, StatusCode};

use crate::config::CorsConfig;
use crate::context::Context;
use crate::dispatch::{Handler, HandlerResult, Next};

/// Adds CORS headers and answers preflight requests itself.
#[derive(Debug, Clone)]
pub struct Cors {
    origin: String,
    methods: String,
    headers: String,
    credentials: bool,
}

impl Default for Cors {
    fn default() -> Self {
        Self::from_config(&CorsConfig::default())
    }
}

impl Cors {
    pub fn new(origin: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            ..Self::default()
        }
    }

    pub fn from_config(config: &CorsConfig) -> Self {
        Self {
            origin: config.allowed_origin.clone(),
            methods: config.allowed_methods.join(", "),
            headers: config.allowed_headers.join(", "),
            credentials: config.allow_credentials,
        }
    }

    pub fn allow_methods<I, S>(mut self, methods: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.methods = join(methods);
        self
    }

    pub fn allow_headers<I, S>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.headers = join(headers);
        self
    }

    pub fn allow_credentials(mut self, allow: bool) -> Self {
        self.credentials = allow;
        self
    }
}

fn join<I, S>(items: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    items
        .into_iter()
        .map(|s| s.as_ref().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

impl Handler for Cors {
    fn call(&self, ctx: &mut Context, next: Next<'_>) -> HandlerResult {
        ctx.response
            .set_header("access-control-allow-origin", &self.origin)?
            .set_header("access-control-allow-methods", &self.methods)?
            .set_header("access-control-allow-headers", &self.headers)?;
        if self.credentials {
            ctx.response
                .set_header("access-control-allow-credentials", "true")?;
        }

        // Preflight ends here.
        if ctx.method() == Method::OPTIONS {
            ctx.response.set_status(StatusCode::NO_CONTENT)?.send("")?;
            return Ok(());
        }

        next.run(ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::Dispatcher;
    use crate::routing::Router;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_preflight_answered_without_proceeding() {
        let hits = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&hits);

        let mut router = Router::new();
        router.use_handler(Cors::new("https://app.example").allow_credentials(true));
        router
            .all("/items", move |ctx, _next| {
                seen.fetch_add(1, Ordering::SeqCst);
                ctx.text(StatusCode::OK, "items")?;
                Ok(())
            })
            .unwrap();
        let dispatcher = Dispatcher::new(router);

        let mut ctx = Context::new(Method::OPTIONS, "/items", Default::default(), Default::default());
        dispatcher.dispatch(&mut ctx);
        assert_eq!(ctx.response.status(), StatusCode::NO_CONTENT);
        assert_eq!(
            ctx.response.header("access-control-allow-origin"),
            Some("https://app.example")
        );
        assert_eq!(ctx.response.header("access-control-allow-credentials"), Some("true"));
        assert_eq!(hits.load(Ordering::SeqCst), 0);

        let mut ctx = Context::new(Method::GET, "/items", Default::default(), Default::default());
        dispatcher.dispatch(&mut ctx);
        assert_eq!(ctx.response.status(), StatusCode::OK);
        assert_eq!(
            ctx.response.header("access-control-allow-methods"),
            Some("GET, POST, PUT, DELETE, OPTIONS")
        );
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }
}
