//! Origin aggregation subsystem.
//!
//! # Data Flow
//! ```text
//! raw query string (?p=..&i=..&s=..)
//!     → pattern.rs (expand prefix/inner/suffix into URLs)
//!     → engine.rs (fan out one task per URL, race against the deadline)
//!         → fetcher.rs (one GET per URL, full body read)
//!         → data_uri.rs (RFC 2397 encoding of the body)
//!     → ResultSet (one entry per requested URL, win or lose)
//!     → cache_control.rs (shared max-age across the origin responses)
//! ```
//!
//! # Design Decisions
//! - Per-URL failures are data carried in the ResultSet, never control flow
//! - The result set is pre-seeded with timeout placeholders
//! - No retries: every origin is fetched at most once per aggregate request

pub mod cache_control;
pub mod data_uri;
pub mod engine;
pub mod fetcher;
pub mod pattern;
pub mod types;

pub use cache_control::max_age;
pub use engine::Aggregator;
pub use fetcher::{build_client, fetch, ClientBuildError};
pub use pattern::{decode_urls, DecodeError, UrlPattern};
pub use types::{FetchError, FetchOutcome, FetchResult, ResponseMeta, ResultSet};
