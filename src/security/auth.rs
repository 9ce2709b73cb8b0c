//! Credential checks for protected routes.

use axum::http::StatusCode;
use serde_json::json;

use crate::context::Context;
use crate::dispatch::{Handler, HandlerResult, Next};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthStrategy {
    /// `Authorization: Bearer <secret>`.
    Bearer,
    /// The configured header carries the secret verbatim.
    ApiKey,
}

/// Inserted into the Context extensions once a request is authenticated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub strategy: AuthStrategy,
}

/// Middleware answering `401` unless the request carries the secret.
#[derive(Debug, Clone)]
pub struct RequireAuth {
    strategy: AuthStrategy,
    header: String,
    secret: String,
}

impl RequireAuth {
    pub fn bearer(secret: impl Into<String>) -> Self {
        Self {
            strategy: AuthStrategy::Bearer,
            header: "authorization".to_string(),
            secret: secret.into(),
        }
    }

    pub fn api_key(header: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            strategy: AuthStrategy::ApiKey,
            header: header.into(),
            secret: secret.into(),
        }
    }

    fn verify(&self, value: &str) -> Result<(), &'static str> {
        match self.strategy {
            AuthStrategy::Bearer => {
                let token = value
                    .strip_prefix("Bearer ")
                    .ok_or("Invalid authorization format")?;
                if token == self.secret {
                    Ok(())
                } else {
                    Err("Invalid token")
                }
            }
            AuthStrategy::ApiKey => {
                if value == self.secret {
                    Ok(())
                } else {
                    Err("Invalid API key")
                }
            }
        }
    }
}

impl Handler for RequireAuth {
    fn call(&self, ctx: &mut Context, next: Next<'_>) -> HandlerResult {
        let outcome = match ctx.header(&self.header) {
            None => Err(format!("Missing {} header", self.header)),
            Some(value) => self.verify(value).map_err(str::to_string),
        };

        match outcome {
            Ok(()) => {
                ctx.extensions_mut().insert(Principal {
                    strategy: self.strategy,
                });
                next.run(ctx)
            }
            Err(message) => {
                tracing::debug!(path = %ctx.path(), reason = %message, "Authentication failed");
                ctx.json(
                    StatusCode::UNAUTHORIZED,
                    &json!({ "error": "Unauthorized", "message": message }),
                )?;
                Ok(())
            }
        }
    }
}
