//! Gzip response compression.
//!
//! # Design Decisions
//! - Runs after the rest of the chain and compresses the buffered body in place
//! - Only bodies larger than `min_size` are compressed, and only when the
//!   client lists `gzip` in `Accept-Encoding` with a non-zero quality
//! - Flushed responses and bodies that already carry a `Content-Encoding`
//!   are left alone
//! - Error responses are rendered after this element returns, so they go out
//!   uncompressed

use std::io::Write;

use axum::http::header;
use flate2::write::GzEncoder;

use crate::config::CompressionConfig;
use crate::context::Context;
use crate::dispatch::{Handler, HandlerResult, Next};

#[derive(Debug, Clone)]
pub struct Compression {
    min_size: usize,
    level: flate2::Compression,
}

impl Default for Compression {
    fn default() -> Self {
        Self::from_config(&CompressionConfig::default())
    }
}

impl Compression {
    pub fn new(min_size: usize) -> Self {
        Self {
            min_size,
            level: flate2::Compression::default(),
        }
    }

    pub fn from_config(config: &CompressionConfig) -> Self {
        Self::new(config.min_size)
    }

    fn applies(&self, ctx: &Context) -> bool {
        !ctx.response.is_sent()
            && ctx.response.body().len() > self.min_size
            && ctx.response.header(header::CONTENT_ENCODING.as_str()).is_none()
            && ctx
                .header(header::ACCEPT_ENCODING.as_str())
                .is_some_and(accepts_gzip)
    }
}

impl Handler for Compression {
    fn call(&self, ctx: &mut Context, next: Next<'_>) -> HandlerResult {
        next.run(ctx)?;
        if !self.applies(ctx) {
            return Ok(());
        }

        let mut encoder = GzEncoder::new(Vec::new(), self.level);
        encoder.write_all(ctx.response.body())?;
        let compressed = encoder.finish()?;
        tracing::debug!(
            path = %ctx.path(),
            original = ctx.response.body().len(),
            compressed = compressed.len(),
            "Compressed response"
        );

        ctx.response
            .set_header(header::CONTENT_ENCODING.as_str(), "gzip")?
            .append_header(header::VARY.as_str(), "Accept-Encoding")?
            .send(compressed)?;
        Ok(())
    }
}

/// Whether an `Accept-Encoding` value lists gzip with a non-zero quality.
fn accepts_gzip(value: &str) -> bool {
    value.split(',').any(|entry| {
        let mut parts = entry.split(';').map(str::trim);
        let coding = parts.next().unwrap_or_default();
        if !coding.eq_ignore_ascii_case("gzip") {
            return false;
        }
        let quality = parts
            .find_map(|p| p.strip_prefix("q="))
            .and_then(|q| q.parse::<f32>().ok())
            .unwrap_or(1.0);
        quality > 0.0
    })
}
