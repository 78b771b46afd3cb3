//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Build the outbound client and the aggregation engine
//! - Create the Axum Router with the aggregate and diagnostics handlers
//! - Wire up middleware (tracing, request ID, logging, compression, CORS)
//! - Serve on a listener until shutdown is signalled

use std::sync::Arc;
use std::time::Duration;

use axum::{
    http::header::InvalidHeaderValue,
    middleware,
    routing::{any, get},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::aggregate::{build_client, Aggregator, ClientBuildError};
use crate::config::GatewayConfig;
use crate::http::handler::{aggregate_handler, diagnostics_handler};
use crate::http::middleware::{cors_middleware, log_request, CorsPolicy};
use crate::http::request::GatewayRequestId;
use crate::observability::metrics::FetchMetrics;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub aggregator: Aggregator,
    /// Deadline for one aggregate request.
    pub timeout: Duration,
}

#[derive(Debug, thiserror::Error)]
pub enum ServerBuildError {
    #[error(transparent)]
    Client(#[from] ClientBuildError),

    #[error("invalid allowed origins: {0}")]
    AllowedOrigins(#[from] InvalidHeaderValue),
}

/// HTTP server for the aggregation gateway.
pub struct HttpServer {
    router: Router,
    config: GatewayConfig,
    metrics: Arc<FetchMetrics>,
}

impl HttpServer {
    /// Create a new HTTP server with its own metrics collector.
    pub fn new(config: GatewayConfig) -> Result<Self, ServerBuildError> {
        Self::with_metrics(config, Arc::new(FetchMetrics::new()))
    }

    /// Create a new HTTP server reporting into the given collector.
    pub fn with_metrics(
        config: GatewayConfig,
        metrics: Arc<FetchMetrics>,
    ) -> Result<Self, ServerBuildError> {
        let client = build_client(&config.origin)?;

        let aggregator = Aggregator::new(client, metrics.clone())
            .with_fetch_limit(config.origin.max_concurrent_fetches)
            .with_straggler_policy(config.origin.straggler_policy);

        let state = AppState {
            aggregator,
            timeout: config.origin.timeout(),
        };

        let router = build_router(&config, state)?;
        Ok(Self {
            router,
            config,
            metrics,
        })
    }

    /// Run the server until the shutdown channel fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            json_root = %self.config.http.json_root,
            timeout_ms = self.config.origin.timeout_ms,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// The fully layered router, for driving requests without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn metrics(&self) -> &Arc<FetchMetrics> {
        &self.metrics
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }
}

/// Build the Axum router with all middleware layers.
pub fn build_router(config: &GatewayConfig, state: AppState) -> Result<Router, ServerBuildError> {
    let cors = CorsPolicy::new(&config.http.allowed_origins)?;

    let mut router = Router::new()
        .route(&config.http.json_root, any(aggregate_handler))
        .route(&config.http.diagnostics_path, get(diagnostics_handler))
        .with_state(state)
        .layer(middleware::from_fn_with_state(cors, cors_middleware));

    if config.http.compression {
        router = router.layer(CompressionLayer::new());
    }

    Ok(router.layer(
        ServiceBuilder::new()
            .layer(SetRequestIdLayer::x_request_id(GatewayRequestId))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(middleware::from_fn(log_request)),
    ))
}
