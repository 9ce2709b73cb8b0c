//! Per-client rate limiting.
//!
//! # Design Decisions
//! - Sliding window: each client keeps the instants of its admitted
//!   requests inside the window
//! - The limiter is injected into the middleware, never global; several
//!   routers may share one limiter through an `Arc`
//! - Stale entries are dropped by `purge_expired`, which the server runs
//!   on an interval

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use axum::http::StatusCode;
use dashmap::DashMap;
use serde_json::json;

use crate::config::RateLimitConfig;
use crate::context::Context;
use crate::dispatch::{Handler, HandlerResult, Next};
use crate::observability::metrics;

/// Result of admitting one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateDecision {
    pub allowed: bool,
    pub limit: u32,
    pub remaining: u32,
    /// Time until the oldest request in the window expires.
    pub reset_after: Duration,
}

/// Sliding-window request counter keyed by client.
#[derive(Debug)]
pub struct RateLimiter {
    windows: DashMap<String, VecDeque<Instant>>,
    max_requests: u32,
    window: Duration,
}

impl RateLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            windows: DashMap::new(),
            max_requests,
            window,
        }
    }

    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self::new(config.max_requests, Duration::from_secs(config.window_secs))
    }

    pub fn max_requests(&self) -> u32 {
        self.max_requests
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn check(&self, key: &str) -> RateDecision {
        self.check_at(key, Instant::now())
    }

    /// Admit or reject a request from `key` arriving at `now`.
    pub fn check_at(&self, key: &str, now: Instant) -> RateDecision {
        let mut entry = self.windows.entry(key.to_string()).or_default();
        let hits = entry.value_mut();
        while let Some(&oldest) = hits.front() {
            if now.saturating_duration_since(oldest) >= self.window {
                hits.pop_front();
            } else {
                break;
            }
        }

        let allowed = (hits.len() as u64) < u64::from(self.max_requests);
        if allowed {
            hits.push_back(now);
        }

        let reset_after = hits
            .front()
            .map(|&oldest| self.window.saturating_sub(now.saturating_duration_since(oldest)))
            .unwrap_or(self.window);
        let used = u32::try_from(hits.len()).unwrap_or(u32::MAX);

        RateDecision {
            allowed,
            limit: self.max_requests,
            remaining: self.max_requests.saturating_sub(used),
            reset_after,
        }
    }

    pub fn purge_expired(&self) -> usize {
        self.purge_expired_at(Instant::now())
    }

    /// Drop clients with no request inside the window. Returns how many
    /// were removed.
    pub fn purge_expired_at(&self, now: Instant) -> usize {
        let before = self.windows.len();
        self.windows.retain(|_, hits| {
            hits.back()
                .is_some_and(|&last| now.saturating_duration_since(last) < self.window)
        });
        let removed = before.saturating_sub(self.windows.len());
        if removed > 0 {
            tracing::debug!(removed, remaining = self.windows.len(), "Purged rate limit entries");
        }
        removed
    }

    /// Number of tracked clients.
    pub fn tracked_clients(&self) -> usize {
        self.windows.len()
    }
}

/// Key used to attribute a request to a client: first `X-Forwarded-For`
/// entry, else the peer address.
pub fn client_key(ctx: &Context) -> String {
    if let Some(forwarded) = ctx.header("x-forwarded-for") {
        if let Some(first) = forwarded.split(',').map(str::trim).find(|s| !s.is_empty()) {
            return first.to_string();
        }
    }
    ctx.request
        .remote_addr()
        .map(|addr| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Middleware rejecting clients over their window with `429`.
#[derive(Debug, Clone)]
pub struct RateLimit {
    limiter: Arc<RateLimiter>,
}

impl RateLimit {
    pub fn new(limiter: Arc<RateLimiter>) -> Self {
        Self { limiter }
    }
}

impl Handler for RateLimit {
    fn call(&self, ctx: &mut Context, next: Next<'_>) -> HandlerResult {
        let key = client_key(ctx);
        let decision = self.limiter.check(&key);

        if !decision.allowed {
            tracing::warn!(client = %key, limit = decision.limit, "Rate limit exceeded");
            metrics::record_rate_limited("window");
            let retry_after = decision.reset_after.as_secs().max(1).to_string();
            ctx.response.set_header("retry-after", &retry_after)?;
            ctx.json(
                StatusCode::TOO_MANY_REQUESTS,
                &json!({
                    "error": "Too Many Requests",
                    "message": format!(
                        "Rate limit of {} requests per {} seconds exceeded",
                        decision.limit,
                        self.limiter.window().as_secs()
                    ),
                }),
            )?;
            return Ok(());
        }

        let reset_at = SystemTime::now()
            .checked_add(decision.reset_after)
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .unwrap_or_default()
            .as_secs();
        ctx.response
            .set_header("x-ratelimit-limit", &decision.limit.to_string())?
            .set_header("x-ratelimit-remaining", &decision.remaining.to_string())?
            .set_header("x-ratelimit-reset", &reset_at.to_string())?;

        next.run(ctx)
    }
}
