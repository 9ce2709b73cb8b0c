//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, limits > 0)
//! - Check addresses parse and the static prefix is a literal path
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: AppConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::AppConfig;
use crate::routing::pattern::normalize_mount_prefix;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.server.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "server.bind_address",
            format!("`{}` is not a socket address", config.server.bind_address),
        ));
    }
    if config.server.request_timeout_secs == 0 {
        errors.push(ValidationError::new("server.request_timeout_secs", "must be greater than 0"));
    }
    if config.server.max_body_size == 0 {
        errors.push(ValidationError::new("server.max_body_size", "must be greater than 0"));
    }

    if config.static_files.enabled {
        if normalize_mount_prefix(&config.static_files.prefix).is_err() {
            errors.push(ValidationError::new(
                "static_files.prefix",
                "must be a literal path starting with '/'",
            ));
        }
        if config.static_files.root.trim().is_empty() {
            errors.push(ValidationError::new("static_files.root", "must not be empty"));
        }
    }

    if config.rate_limit.enabled {
        if config.rate_limit.max_requests == 0 {
            errors.push(ValidationError::new("rate_limit.max_requests", "must be greater than 0"));
        }
        if config.rate_limit.window_secs == 0 {
            errors.push(ValidationError::new("rate_limit.window_secs", "must be greater than 0"));
        }
        if config.rate_limit.purge_interval_secs == 0 {
            errors.push(ValidationError::new(
                "rate_limit.purge_interval_secs",
                "must be greater than 0",
            ));
        }
    }

    let cookie = &config.session.cookie_name;
    if cookie.is_empty()
        || !cookie
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        errors.push(ValidationError::new(
            "session.cookie_name",
            "must be non-empty and use only [A-Za-z0-9_-]",
        ));
    }
    if config.session.ttl_secs == 0 {
        errors.push(ValidationError::new("session.ttl_secs", "must be greater than 0"));
    }

    if config.security.api_token.is_empty() {
        errors.push(ValidationError::new("security.api_token", "must not be empty"));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("`{}` is not a socket address", config.observability.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&AppConfig::default()).is_ok());
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = AppConfig::default();
        config.server.bind_address = "nope".into();
        config.server.request_timeout_secs = 0;
        config.static_files.prefix = "/static/:file".into();
        config.session.cookie_name = "bad name".into();

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert_eq!(
            fields,
            vec![
                "server.bind_address",
                "server.request_timeout_secs",
                "static_files.prefix",
                "session.cookie_name",
            ]
        );
    }

    #[test]
    fn test_rate_limit_checked_only_when_enabled() {
        let mut config = AppConfig::default();
        config.rate_limit.max_requests = 0;
        assert!(validate_config(&config).is_ok());

        config.rate_limit.enabled = true;
        assert!(validate_config(&config).is_err());
    }
}
