//! Freeload aggregation gateway.
//!
//! # Architecture Overview
//!
//! ```text
//!                         ┌──────────────────────────────────────────────────┐
//!                         │                    GATEWAY                       │
//!                         │                                                  │
//!   GET /json?p=&i=&s=    │  ┌──────────┐   ┌──────────┐   ┌─────────────┐   │
//!   ──────────────────────┼─▶│  layers  │──▶│ handler  │──▶│   pattern   │   │
//!                         │  │ cors/gzip│   │          │   │   decoder   │   │
//!                         │  └──────────┘   └──────────┘   └──────┬──────┘   │
//!                         │                                       │          │
//!                         │                                       ▼          │
//!                         │                               ┌─────────────┐    │     Origin
//!                         │                               │ aggregation │────┼───▶ servers
//!                         │                               │   engine    │◀───┼──── (N GETs)
//!                         │                               └──────┬──────┘    │
//!                         │                                      │           │
//!   JSON {url: uri|err}   │  ┌──────────┐   ┌──────────────┐     │           │
//!   ◀─────────────────────┼──│ response │◀──│ cache-control│◀────┘           │
//!                         │  │  writer  │   │  aggregator  │                 │
//!                         │  └──────────┘   └──────────────┘                 │
//!                         └──────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;

use freeload_gateway::config::{load_config, validate_config, ConfigError, GatewayConfig};
use freeload_gateway::lifecycle;

#[derive(Debug, Parser)]
#[command(name = "freeload-gateway", version)]
#[command(about = "Aggregates origin fetches into one JSON document of data URIs")]
struct Args {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Host:Port to listen on
    #[arg(long = "http")]
    bind: Option<String>,

    /// URL of the proxy server for outbound requests
    #[arg(long)]
    proxy: Option<String>,

    /// Root path to deliver JSON
    #[arg(long = "json")]
    json_root: Option<String>,

    /// Origins to allow with CORS
    #[arg(long)]
    origins: Option<String>,

    /// Maximum time per aggregate request in seconds
    #[arg(long)]
    timeout: Option<f64>,
}

impl Args {
    fn apply(self, config: &mut GatewayConfig) {
        if let Some(bind) = self.bind {
            config.listener.bind_address = normalize_bind(bind);
        }
        if let Some(proxy) = self.proxy.filter(|p| !p.is_empty()) {
            config.origin.proxy_url = Some(proxy);
        }
        if let Some(json_root) = self.json_root {
            config.http.json_root = json_root;
        }
        if let Some(origins) = self.origins {
            config.http.allowed_origins = origins;
        }
        if let Some(timeout) = self.timeout {
            config.origin.timeout_ms = (timeout.max(0.0) * 1000.0).round() as u64;
        }
    }
}

/// Accept the `:7433` shorthand for all interfaces.
fn normalize_bind(bind: String) -> String {
    if bind.starts_with(':') {
        format!("0.0.0.0{bind}")
    } else {
        bind
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = Args::parse();

    let mut config = match args.config.take() {
        Some(path) => load_config(&path)?,
        None => GatewayConfig::default(),
    };
    args.apply(&mut config);
    validate_config(&config).map_err(ConfigError::Validation)?;

    lifecycle::run(config).await?;
    Ok(())
}
