//! Aggregate response writing and error mapping.
//!
//! # Responsibilities
//! - Serialize the ResultSet as a JSON object keyed by requested URL
//! - Derive the response `Cache-Control` from the origin responses
//! - Map request-level failures to HTTP status codes
//!
//! # Design Decisions
//! - Per-URL failures are part of a 200 response body
//! - Only bad queries (400) and encoding failures (500) fail the request

use axum::http::header::{CACHE_CONTROL, CONTENT_TYPE};
use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::aggregate::{max_age, DecodeError, ResultSet};

pub const JSON_CONTENT_TYPE: &str = "text/json;charset=utf-8";
pub const NO_STORE: &str = "private,no-store,max-age=0";

/// Request-level failures.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("bad query parameters: {0}")]
    BadQuery(#[from] DecodeError),

    #[error("unsupported method")]
    UnsupportedMethod(Method),

    #[error("JSON encoding error: {0}")]
    Encoding(#[from] serde_json::Error),
}

impl GatewayError {
    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::BadQuery(_) | GatewayError::UnsupportedMethod(_) => StatusCode::BAD_REQUEST,
            GatewayError::Encoding(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        match &self {
            GatewayError::Encoding(e) => tracing::error!(error = %e, "Failed to encode aggregate response"),
            GatewayError::UnsupportedMethod(method) => tracing::debug!(method = %method, "Rejected method"),
            GatewayError::BadQuery(e) => tracing::debug!(error = %e, "Rejected query"),
        }
        (self.status(), format!("{self}\n")).into_response()
    }
}

/// `Cache-Control` value for an aggregate with the given shared max-age.
pub fn cache_control_value(max_age: i64) -> String {
    if max_age > 0 {
        format!("public,max-age={max_age}")
    } else {
        NO_STORE.to_string()
    }
}

/// Build the 200 response for a completed ResultSet.
pub fn write_response_json(results: &ResultSet) -> Result<Response, GatewayError> {
    let mut body = serde_json::to_vec(results)?;
    body.push(b'\n');

    let headers = [
        (CACHE_CONTROL, cache_control_value(max_age(results))),
        (CONTENT_TYPE, JSON_CONTENT_TYPE.to_string()),
    ];
    Ok((StatusCode::OK, headers, body).into_response())
}
