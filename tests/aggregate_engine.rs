//! Aggregation engine behaviour against live mock origins.

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::http::StatusCode;
use reqwest::header::CACHE_CONTROL;

use freeload_gateway::aggregate::{fetch, max_age, Aggregator, FetchError};
use freeload_gateway::config::StragglerPolicy;
use freeload_gateway::observability::metrics::FetchMetrics;

mod common;

fn aggregator(client: reqwest::Client) -> Aggregator {
    Aggregator::new(client, Arc::new(FetchMetrics::new()))
}

#[tokio::test]
async fn test_fetch_encodes_body() {
    let origin = common::start_path_echo_origin().await;
    let client = common::proxied_client(origin);

    let result = fetch(&client, "http://test/ohai").await;

    assert_eq!(result.request_uri(), "http://test/ohai");
    assert_eq!(
        result.data_uri(),
        Some("data:text/plain;charset=utf-8;base64,L29oYWk=")
    );
    assert!(result.error().is_none());
    assert_eq!(result.response().unwrap().status, StatusCode::OK);
}

#[tokio::test]
async fn test_fetch_keeps_error_status_bodies() {
    let origin = common::start_programmable_origin(|_, _| async { (StatusCode::NOT_FOUND, "gone") }).await;
    let client = common::proxied_client(origin);

    let result = fetch(&client, "http://test/missing").await;

    assert_eq!(result.data_uri(), Some("data:text/plain;charset=utf-8;base64,Z29uZQ=="));
    assert_eq!(result.response().unwrap().status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_fetch_transport_failure() {
    let closed = common::closed_port().await;
    let client = common::direct_client();
    let url = format!("http://{closed}/nothing");

    let result = fetch(&client, &url).await;

    assert!(matches!(result.error(), Some(FetchError::Transport(_))));
    assert!(result.data_uri().is_none());
    assert!(result.response().is_none());
}

#[tokio::test]
async fn test_fetch_truncated_body_keeps_response() {
    let origin = common::start_truncated_body_origin().await;
    let client = common::direct_client();
    let url = format!("http://{origin}/short");

    let result = fetch(&client, &url).await;

    assert!(matches!(result.error(), Some(FetchError::Body(_))));
    assert!(result.data_uri().is_none(), "No data URI for a partial body");
    let response = result.response().expect("Status line was received");
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.header(CACHE_CONTROL), Some("max-age=5"));
}

#[tokio::test]
async fn test_max_age_skips_truncated_body() {
    let truncated = common::start_truncated_body_origin().await;
    let cached = common::start_slow_after_first_origin(Duration::ZERO).await;
    let engine = aggregator(common::direct_client());

    let broken = format!("http://{truncated}/short");
    let good = format!("http://{cached}/ok");
    let res = engine.get_all(&[broken.clone(), good.clone()], Duration::from_secs(5)).await;

    assert!(matches!(res.get(&broken).unwrap().error(), Some(FetchError::Body(_))));
    assert!(res.get(&good).unwrap().is_success());
    assert_eq!(max_age(&res), 10, "Failed entry does not bound the max-age");
}

#[tokio::test]
async fn test_get_all_splits_fast_and_timed_out() {
    let origin = common::start_slow_after_first_origin(Duration::from_secs(2)).await;
    let engine = aggregator(common::proxied_client(origin));

    let (u1, u2) = ("http://test/ohai?1", "http://test/ohai?2");
    let res = engine.get_all(&[u1, u2], Duration::from_millis(500)).await;

    assert_eq!(res.len(), 2, "Every requested URL has an entry");

    let (good, bad) = if res.get(u1).unwrap().error().is_some() {
        (res.get(u2).unwrap(), res.get(u1).unwrap())
    } else {
        (res.get(u1).unwrap(), res.get(u2).unwrap())
    };

    assert_eq!(good.data_uri(), Some("data:text/plain;charset=utf-8;base64,L29oYWk="));
    assert_eq!(
        good.response().unwrap().header(CACHE_CONTROL),
        Some("max-age=10"),
        "The mock origin responds with cacheable content"
    );

    assert!(bad.data_uri().is_none(), "Timeout carries no data URI");
    assert!(bad.error().is_some_and(FetchError::is_timeout));
    assert_eq!(bad.error().unwrap().to_string(), "timeout 500ms");
    assert!(bad.response().is_none(), "Timeout carries no response headers");

    assert_eq!(max_age(&res), 10);
}

#[tokio::test]
async fn test_get_all_returns_at_deadline() {
    let origin = common::start_programmable_origin(|_, _| async {
        tokio::time::sleep(Duration::from_secs(5)).await;
        "late"
    })
    .await;
    let engine = aggregator(common::proxied_client(origin));

    let start = Instant::now();
    let res = engine.get_all(&["http://test/a", "http://test/b"], Duration::from_millis(200)).await;
    let elapsed = start.elapsed();

    assert_eq!(res.len(), 2);
    assert!(res.iter().all(|r| r.error().is_some_and(FetchError::is_timeout)));
    assert!(elapsed >= Duration::from_millis(200));
    assert!(elapsed < Duration::from_secs(2), "Returned after {elapsed:?}");
}

#[tokio::test]
async fn test_get_all_returns_early_when_complete() {
    let origin = common::start_path_echo_origin().await;
    let engine = aggregator(common::proxied_client(origin));

    let start = Instant::now();
    let res = engine
        .get_all(&["http://test/a", "http://test/b", "http://test/c"], Duration::from_secs(10))
        .await;

    assert!(start.elapsed() < Duration::from_secs(5));
    assert_eq!(res.len(), 3);
    assert!(res.iter().all(|r| r.is_success()));
    assert_eq!(engine.metrics().success_requests(), 3);
    assert_eq!(engine.metrics().total_requests(), 3);
    assert_eq!(engine.metrics().responses(), 1);
}

#[tokio::test]
async fn test_get_all_empty() {
    let engine = aggregator(common::direct_client());
    let urls: [&str; 0] = [];

    let res = engine.get_all(&urls, Duration::from_secs(10)).await;

    assert!(res.is_empty());
    assert_eq!(engine.metrics().total_requests(), 0);
}

#[tokio::test]
async fn test_get_all_collapses_duplicates() {
    let origin = common::start_path_echo_origin().await;
    let engine = aggregator(common::proxied_client(origin));

    let res = engine
        .get_all(&["http://test/x", "http://test/x", "http://test/y"], Duration::from_secs(5))
        .await;

    assert_eq!(res.len(), 2);
    assert!(res.contains("http://test/x"));
    assert!(res.contains("http://test/y"));
    assert_eq!(engine.metrics().total_requests(), 2);
}

#[tokio::test]
async fn test_get_all_mixes_failures_and_successes() {
    let origin = common::start_path_echo_origin().await;
    let closed = common::closed_port().await;
    let engine = aggregator(common::direct_client());

    let good = format!("http://{origin}/ok");
    let bad = format!("http://{closed}/down");
    let res = engine.get_all(&[good.clone(), bad.clone()], Duration::from_secs(5)).await;

    assert_eq!(res.len(), 2);
    assert!(res.get(&good).unwrap().is_success());
    assert!(matches!(res.get(&bad).unwrap().error(), Some(FetchError::Transport(_))));
    assert_eq!(max_age(&res), -1, "Successful response without Cache-Control");
}

#[tokio::test]
async fn test_detached_stragglers_stay_pending() {
    let origin = common::start_slow_after_first_origin(Duration::from_secs(2)).await;
    let engine = aggregator(common::proxied_client(origin));

    let res = engine
        .get_all(&["http://test/1", "http://test/2"], Duration::from_millis(500))
        .await;

    assert_eq!(res.len(), 2);
    assert_eq!(engine.metrics().pending_requests(), 1, "Straggler still in flight");
    assert_eq!(engine.metrics().success_requests(), 1);
}

#[tokio::test]
async fn test_aborted_stragglers_release_pending() {
    let origin = common::start_slow_after_first_origin(Duration::from_secs(5)).await;
    let engine = aggregator(common::proxied_client(origin)).with_straggler_policy(StragglerPolicy::Abort);

    let res = engine
        .get_all(&["http://test/1", "http://test/2"], Duration::from_millis(500))
        .await;
    assert_eq!(res.len(), 2);

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(engine.metrics().pending_requests(), 0, "Aborted fetch released its slot");
    assert_eq!(engine.metrics().total_requests(), 2);
}

#[tokio::test]
async fn test_fetch_limit_still_covers_every_url() {
    let origin = common::start_programmable_origin(|_, uri: axum::http::Uri| async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        uri.path().to_string()
    })
    .await;
    let engine = aggregator(common::proxied_client(origin)).with_fetch_limit(Some(1));

    let urls: Vec<String> = (0..4).map(|i| format!("http://test/{i}")).collect();
    let start = Instant::now();
    let res = engine.get_all(&urls, Duration::from_secs(5)).await;

    assert_eq!(res.len(), 4);
    assert!(res.iter().all(|r| r.is_success()));
    assert!(start.elapsed() >= Duration::from_millis(400), "Fetches ran one at a time");
}
