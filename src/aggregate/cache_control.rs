//! Shared cache lifetime for an aggregate response.
//!
//! The aggregate is only as fresh as its stalest origin, so the lowest
//! `max-age` among the successful origin responses bounds the whole response.

use reqwest::header::CACHE_CONTROL;

use crate::aggregate::types::{FetchOutcome, ResultSet};

/// Returned when the aggregate must not be cached.
pub const UNCACHEABLE: i64 = -1;

/// Lowest `max-age` across the successful results, or [`UNCACHEABLE`].
///
/// - Failed entries are skipped.
/// - A successful entry without `Cache-Control` makes the aggregate uncacheable.
/// - A `Cache-Control` without a parseable `max-age` does not bound the result.
/// - With no bound at all the aggregate is uncacheable.
pub fn max_age(results: &ResultSet) -> i64 {
    let mut lowest: Option<i64> = None;

    for result in results {
        let FetchOutcome::Fetched { response, .. } = result.outcome() else {
            continue;
        };

        let Some(value) = response.headers.get(CACHE_CONTROL) else {
            return UNCACHEABLE;
        };

        let candidate = value.to_str().ok().and_then(parse_max_age);
        if let Some(candidate) = candidate {
            lowest = Some(lowest.map_or(candidate, |current| current.min(candidate)));
        }
    }

    lowest.unwrap_or(UNCACHEABLE)
}

/// Extract `max-age=<N>` from a `Cache-Control` header value.
pub fn parse_max_age(cache_control: &str) -> Option<i64> {
    cache_control.split(',').find_map(|directive| {
        let (name, value) = directive.split_once('=')?;
        if !name.trim().eq_ignore_ascii_case("max-age") {
            return None;
        }
        value.trim().trim_matches('"').parse::<u32>().ok().map(i64::from)
    })
}
