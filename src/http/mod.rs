//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, layer stack)
//!     → request.rs (request ID generation and propagation)
//!     → middleware/ (request logging, compression, CORS)
//!     → handler.rs (decode query, run the aggregation engine)
//!     → response.rs (JSON body, cache headers, error mapping)
//!     → Send to client
//! ```

pub mod handler;
pub mod middleware;
pub mod request;
pub mod response;
pub mod server;

pub use request::{request_id, GatewayRequestId, X_REQUEST_ID};
pub use response::{write_response_json, GatewayError};
pub use server::{build_router, AppState, HttpServer, ServerBuildError};
