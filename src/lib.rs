//! Freeload aggregation gateway library.
//!
//! One request names a set of origin URLs compactly (prefix, inner parts,
//! suffix); the gateway fetches them all concurrently, encodes each body as a
//! data URI and answers with a single JSON document within a fixed deadline.

pub mod aggregate;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;

pub use aggregate::{Aggregator, FetchError, FetchResult, ResultSet};
pub use config::GatewayConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
