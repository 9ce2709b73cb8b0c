//! Declarative presence checks on headers, query and body.

use axum::http::StatusCode;
use serde_json::json;

use crate::context::Context;
use crate::dispatch::{Handler, HandlerResult, Next};

/// Rejects the request with `400` and a list of problems when any required
/// item is missing or empty.
#[derive(Debug, Clone, Default)]
pub struct Validate {
    headers: Vec<String>,
    query: Vec<String>,
    body: Vec<String>,
}

impl Validate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn header(mut self, name: impl Into<String>) -> Self {
        self.headers.push(name.into());
        self
    }

    pub fn query(mut self, name: impl Into<String>) -> Self {
        self.query.push(name.into());
        self
    }

    /// Require a field in a JSON object or form body.
    pub fn body_field(mut self, name: impl Into<String>) -> Self {
        self.body.push(name.into());
        self
    }

    /// Every problem found, in declaration order.
    pub fn check(&self, ctx: &Context) -> Vec<String> {
        let mut errors = Vec::new();
        for name in &self.headers {
            if ctx.header(name).map_or(true, str::is_empty) {
                errors.push(format!("Missing required header: {name}"));
            }
        }
        for name in &self.query {
            if ctx.query(name).map_or(true, str::is_empty) {
                errors.push(format!("Missing required query parameter: {name}"));
            }
        }
        for name in &self.body {
            if ctx.request.body().field(name).is_none() {
                errors.push(format!("Missing required field in body: {name}"));
            }
        }
        errors
    }
}

impl Handler for Validate {
    fn call(&self, ctx: &mut Context, next: Next<'_>) -> HandlerResult {
        let errors = self.check(ctx);
        if errors.is_empty() {
            return next.run(ctx);
        }
        ctx.json(
            StatusCode::BAD_REQUEST,
            &json!({
                "error": "Validation Error",
                "message": "Request validation failed",
                "details": errors,
            }),
        )?;
        Ok(())
    }
}
