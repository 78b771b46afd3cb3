//! Request logging decorator.

use std::time::Instant;

use axum::{body::Body, http::header::ORIGIN, http::Request, middleware::Next, response::Response};

use crate::http::request::request_id;

/// Log method, `Origin` and URI of every request, then its status and latency.
pub async fn log_request(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let request_id = request_id(request.headers()).to_string();
    let origin = request
        .headers()
        .get(ORIGIN)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();

    tracing::info!(
        request_id = %request_id,
        method = %method,
        origin = %origin,
        uri = %uri,
        "Request"
    );

    let start = Instant::now();
    let response = next.run(request).await;

    tracing::debug!(
        request_id = %request_id,
        status = response.status().as_u16(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Response"
    );
    response
}
