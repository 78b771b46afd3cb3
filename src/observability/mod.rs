//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Aggregation engine and HTTP layers produce:
//!     → logging.rs (structured tracing events)
//!     → metrics.rs (fetch counters, pending gauge, latency histogram)
//!
//! Consumers:
//!     → stdout (pretty or JSON lines)
//!     → diagnostics endpoint (counters snapshot as JSON)
//!     → Prometheus scrape endpoint (optional)
//! ```
//!
//! # Design Decisions
//! - Counters live in an injected collector, not process globals
//! - Metric updates are atomic increments; they never affect results
//! - The request ID is attached to every request span

pub mod logging;
pub mod metrics;
