//! Configuration validation.
//!
//! Serde handles syntax; this module checks values that would otherwise fail
//! at startup or panic while building the router. All problems are reported
//! at once.

use std::net::SocketAddr;

use axum::http::HeaderValue;

use crate::config::schema::GatewayConfig;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("listener.bind_address {0:?} is not a socket address")]
    BindAddress(String),

    #[error("observability.metrics_address {0:?} is not a socket address")]
    MetricsAddress(String),

    #[error("origin.timeout_ms must be greater than zero")]
    ZeroTimeout,

    #[error("origin.max_concurrent_fetches must be greater than zero")]
    ZeroFetchLimit,

    #[error("origin.proxy_url {0:?} is not an absolute URL")]
    ProxyUrl(String),

    #[error("{field} {path:?} must be a literal path starting with '/'")]
    Path { field: &'static str, path: String },

    #[error("http.json_root and http.diagnostics_path must differ")]
    PathCollision,

    #[error("http.allowed_origins {0:?} is not a valid header value")]
    AllowedOrigins(String),
}

/// Check a configuration, returning every problem found.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(config.listener.bind_address.clone()));
    }

    let observability = &config.observability;
    if observability.metrics_enabled && observability.metrics_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::MetricsAddress(observability.metrics_address.clone()));
    }

    let origin = &config.origin;
    if origin.timeout_ms == 0 {
        errors.push(ValidationError::ZeroTimeout);
    }
    if origin.max_concurrent_fetches == Some(0) {
        errors.push(ValidationError::ZeroFetchLimit);
    }
    if let Some(proxy) = &origin.proxy_url {
        if url::Url::parse(proxy).is_err() {
            errors.push(ValidationError::ProxyUrl(proxy.clone()));
        }
    }

    let http = &config.http;
    for (field, path) in [
        ("http.json_root", &http.json_root),
        ("http.diagnostics_path", &http.diagnostics_path),
    ] {
        if !is_literal_path(path) {
            errors.push(ValidationError::Path { field, path: path.clone() });
        }
    }
    if http.json_root == http.diagnostics_path {
        errors.push(ValidationError::PathCollision);
    }
    if HeaderValue::from_str(&http.allowed_origins).is_err() {
        errors.push(ValidationError::AllowedOrigins(http.allowed_origins.clone()));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Router paths may not contain capture or wildcard syntax.
fn is_literal_path(path: &str) -> bool {
    path.starts_with('/') && !path.contains(&['{', '}', '*', '?', '#'][..])
}
