//! Example application assembled from configuration.
//!
//! # Data Flow
//! ```text
//! AppConfig
//!     → Services::from_config (rate limiter, session store, user directory)
//!     → build_dispatcher (root router + /api child router + error stage)
//!     → HttpServer
//! ```
//!
//! # Design Decisions
//! - Shared state is created once and injected; handlers capture `Arc`s
//! - Optional middleware is registered only when enabled in config

pub mod pages;
pub mod users;

use std::sync::Arc;

use thiserror::Error;

use crate::config::AppConfig;
use crate::dispatch::Dispatcher;
use crate::middleware::{Compression, Cors, JsonErrorStage, RequestLogger, StaticFiles, StaticFilesError};
use crate::routing::{PatternError, Router};
use crate::security::{RateLimit, RateLimiter, SecurityHeaders};
use crate::session::{LoadSession, SessionStore};

pub use users::{api_router, User, UserDirectory};

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("route registration failed: {0}")]
    Pattern(#[from] PatternError),

    #[error(transparent)]
    StaticFiles(#[from] StaticFilesError),
}

/// Shared state behind the example application.
#[derive(Debug, Clone)]
pub struct Services {
    /// Present only when rate limiting is enabled.
    pub rate_limiter: Option<Arc<RateLimiter>>,
    pub sessions: Arc<SessionStore>,
    pub users: Arc<UserDirectory>,
}

impl Services {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            rate_limiter: config
                .rate_limit
                .enabled
                .then(|| Arc::new(RateLimiter::from_config(&config.rate_limit))),
            sessions: Arc::new(SessionStore::from_config(&config.session)),
            users: Arc::new(UserDirectory::with_sample_data()),
        }
    }
}

/// Build the example application's dispatcher.
pub fn build_dispatcher(config: &AppConfig, services: &Services) -> Result<Dispatcher, BuildError> {
    let mut root = Router::new();
    root.use_handler(RequestLogger::default());
    if config.compression.enabled {
        root.use_handler(Compression::from_config(&config.compression));
    }

    if config.security.enable_headers {
        root.use_handler(SecurityHeaders::default());
    }
    if config.cors.enabled {
        root.use_handler(Cors::from_config(&config.cors));
    }
    if let Some(limiter) = &services.rate_limiter {
        root.use_handler(RateLimit::new(Arc::clone(limiter)));
    }
    if config.static_files.enabled {
        let mut files = StaticFiles::new(&config.static_files.prefix, &config.static_files.root)?;
        if let Some(cache) = &config.static_files.cache_control {
            files = files.with_cache_control(cache);
        }
        root.use_handler(files);
    }
    root.use_handler(LoadSession::new(Arc::clone(&services.sessions)));

    pages::register(&mut root, Arc::clone(&services.sessions), &config.security.api_token)?;
    root.mount("/api", api_router(Arc::clone(&services.users))?)?;

    for route in root.describe() {
        tracing::debug!(method = %route.method, path = %route.path, chain_len = route.chain_len, "Route registered");
    }

    Ok(Dispatcher::new(root).with_error_stage(JsonErrorStage::from_config(&config.errors)))
}
