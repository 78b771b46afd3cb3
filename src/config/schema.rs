//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration for the aggregation gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Outbound origin fetching.
    pub origin: OriginConfig,

    /// Public HTTP surface (paths, CORS, compression).
    pub http: HttpConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:7433").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:7433".to_string(),
        }
    }
}

/// What happens to origin fetches still running when the deadline fires.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StragglerPolicy {
    /// Leave them running; their results are discarded.
    #[default]
    Detach,
    /// Abort them, releasing their connections and buffers.
    Abort,
}

/// Outbound origin fetch configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct OriginConfig {
    /// HTTP proxy for every origin request (e.g., "http://127.0.0.1:3128").
    pub proxy_url: Option<String>,

    /// Deadline for one aggregate request, in milliseconds.
    pub timeout_ms: u64,

    /// Maximum origin fetches in flight. Unbounded when unset.
    pub max_concurrent_fetches: Option<usize>,

    /// Handling of fetches still running at the deadline.
    pub straggler_policy: StragglerPolicy,

    /// User-Agent sent to origins.
    pub user_agent: String,
}

impl OriginConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for OriginConfig {
    fn default() -> Self {
        Self {
            proxy_url: None,
            timeout_ms: 500,
            max_concurrent_fetches: None,
            straggler_policy: StragglerPolicy::Detach,
            user_agent: concat!("freeload-gateway/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Public HTTP surface configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Path serving aggregate JSON responses.
    pub json_root: String,

    /// Value of `Access-Control-Allow-Origin`; "*" accepts every origin.
    pub allowed_origins: String,

    /// Negotiate gzip compression via `Accept-Encoding`.
    pub compression: bool,

    /// Path serving the counters snapshot.
    pub diagnostics_path: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            json_root: "/json".to_string(),
            allowed_origins: "*".to_string(),
            compression: true,
            diagnostics_path: "/debug/vars".to_string(),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` takes precedence.
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
