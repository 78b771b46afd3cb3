//! Aggregate and diagnostics handlers.

use axum::{
    extract::{RawQuery, State},
    http::Method,
    response::Response,
    Json,
};

use crate::aggregate::decode_urls;
use crate::http::response::{write_response_json, GatewayError};
use crate::http::server::AppState;
use crate::observability::metrics::MetricsSnapshot;

/// `GET <json_root>?p=..&i=..&s=..`: fetch every expanded URL and answer with
/// one JSON document.
pub async fn aggregate_handler(
    State(state): State<AppState>,
    method: Method,
    RawQuery(query): RawQuery,
) -> Result<Response, GatewayError> {
    if method != Method::GET {
        return Err(GatewayError::UnsupportedMethod(method));
    }

    let urls = decode_urls(query.as_deref().unwrap_or_default())?;

    tracing::debug!(urls = urls.len(), timeout_ms = state.timeout.as_millis() as u64, "Aggregating");
    let results = state.aggregator.get_all(&urls, state.timeout).await;

    write_response_json(&results)
}

/// Counters snapshot for operational monitoring.
pub async fn diagnostics_handler(State(state): State<AppState>) -> Json<MetricsSnapshot> {
    Json(state.aggregator.metrics().snapshot())
}
