//! Security response headers.
//!
//! # Responsibilities
//! - Add hardening headers to every response passing through
//!
//! # Design Decisions
//! - Headers are set before proceeding, so downstream handlers may still
//!   override them (e.g. a page that needs a looser CSP)

use crate::context::Context;
use crate::dispatch::{Handler, HandlerResult, Next};

#[derive(Debug, Clone)]
pub struct SecurityHeaders {
    pub hsts: Option<String>,
    pub content_security_policy: Option<String>,
    pub referrer_policy: String,
}

impl Default for SecurityHeaders {
    fn default() -> Self {
        Self {
            hsts: Some("max-age=31536000; includeSubDomains".to_string()),
            content_security_policy: Some("default-src 'self'".to_string()),
            referrer_policy: "strict-origin-when-cross-origin".to_string(),
        }
    }
}

impl SecurityHeaders {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn without_hsts(mut self) -> Self {
        self.hsts = None;
        self
    }

    pub fn with_csp(mut self, policy: impl Into<String>) -> Self {
        self.content_security_policy = Some(policy.into());
        self
    }
}

impl Handler for SecurityHeaders {
    fn call(&self, ctx: &mut Context, next: Next<'_>) -> HandlerResult {
        let res = &mut ctx.response;
        res.set_header("x-content-type-options", "nosniff")?
            .set_header("x-frame-options", "DENY")?
            .set_header("x-xss-protection", "1; mode=block")?
            .set_header("referrer-policy", &self.referrer_policy)?;
        if let Some(hsts) = &self.hsts {
            res.set_header("strict-transport-security", hsts)?;
        }
        if let Some(csp) = &self.content_security_policy {
            res.set_header("content-security-policy", csp)?;
        }
        next.run(ctx)
    }
}
