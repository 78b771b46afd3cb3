//! Request/response decorators wrapped around the aggregate handler.

pub mod cors;
pub mod logging;

pub use cors::{cors_middleware, CorsPolicy};
pub use logging::log_request;
