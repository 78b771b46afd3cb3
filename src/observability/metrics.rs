//! Origin fetch metrics.
//!
//! # Metrics
//! - `freeload_origin_requests_total` (counter): origin requests issued
//! - `freeload_origin_requests_pending` (gauge): origin requests in flight
//! - `freeload_origin_requests_success_total` (counter): origin requests that
//!   completed before their deadline
//! - `freeload_responses_total` (counter): aggregate requests served
//! - `freeload_origin_request_duration_seconds` (histogram): origin latency
//!
//! [`FetchMetrics`] keeps its own atomic counters so the diagnostics endpoint
//! and tests can read an isolated instance; every update is also mirrored to
//! the `metrics` facade for the Prometheus exporter.

use std::collections::BTreeMap;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::time::{Duration, Instant};

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, Matcher, PrometheusBuilder};
use serde::Serialize;

const REQUESTS_TOTAL: &str = "freeload_origin_requests_total";
const REQUESTS_PENDING: &str = "freeload_origin_requests_pending";
const REQUESTS_SUCCESS: &str = "freeload_origin_requests_success_total";
const RESPONSES_TOTAL: &str = "freeload_responses_total";
const REQUEST_DURATION: &str = "freeload_origin_request_duration_seconds";

/// `<1ms`, fifteen doubling buckets from 1ms to 16384ms, and `>32s`.
pub const LATENCY_BUCKETS: usize = 17;

/// Lowest latency, in milliseconds, that lands in the `>32s` bucket.
const OVERFLOW_MS: u128 = 32_768;

/// Histogram slot for an origin request duration.
///
/// A duration falls into `[2^k ms, 2^(k+1) ms)`.
pub fn latency_bucket(elapsed: Duration) -> usize {
    let ms = elapsed.as_millis();
    if ms == 0 {
        0
    } else if ms >= OVERFLOW_MS {
        LATENCY_BUCKETS - 1
    } else {
        (u128::BITS - ms.leading_zeros()) as usize
    }
}

pub fn latency_bucket_label(bucket: usize) -> String {
    match bucket {
        0 => "<1ms".to_string(),
        b if b >= LATENCY_BUCKETS - 1 => ">32s".to_string(),
        b => format!("{}ms", 1u64 << (b - 1)),
    }
}

/// Counters for origin fetches and aggregate responses.
#[derive(Debug, Default)]
pub struct FetchMetrics {
    total_requests: AtomicU64,
    pending_requests: AtomicI64,
    success_requests: AtomicU64,
    responses: AtomicU64,
    latencies: [AtomicU64; LATENCY_BUCKETS],
}

impl FetchMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run one origin fetch, counting it as pending while it runs and
    /// recording its latency when it completes.
    pub async fn instrument<F: Future>(&self, fetch: F) -> F::Output {
        let _pending = self.begin_request();
        let start = Instant::now();

        let output = fetch.await;

        self.record_latency(start.elapsed());
        output
    }

    /// Count a new origin request. The pending gauge drops when the guard does.
    pub fn begin_request(&self) -> PendingGuard<'_> {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
        self.pending_requests.fetch_add(1, Ordering::Relaxed);
        counter!(REQUESTS_TOTAL).increment(1);
        gauge!(REQUESTS_PENDING).increment(1.0);
        PendingGuard { metrics: self }
    }

    pub fn record_latency(&self, elapsed: Duration) {
        self.latencies[latency_bucket(elapsed)].fetch_add(1, Ordering::Relaxed);
        histogram!(REQUEST_DURATION).record(elapsed.as_secs_f64());
    }

    /// An origin result was collected before the deadline.
    pub fn record_success(&self) {
        self.success_requests.fetch_add(1, Ordering::Relaxed);
        counter!(REQUESTS_SUCCESS).increment(1);
    }

    /// An aggregate request was served.
    pub fn record_response(&self) {
        self.responses.fetch_add(1, Ordering::Relaxed);
        counter!(RESPONSES_TOTAL).increment(1);
    }

    pub fn total_requests(&self) -> u64 {
        self.total_requests.load(Ordering::Relaxed)
    }

    pub fn pending_requests(&self) -> i64 {
        self.pending_requests.load(Ordering::Relaxed)
    }

    pub fn success_requests(&self) -> u64 {
        self.success_requests.load(Ordering::Relaxed)
    }

    pub fn responses(&self) -> u64 {
        self.responses.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let latencies = self
            .latencies
            .iter()
            .enumerate()
            .map(|(bucket, count)| (latency_bucket_label(bucket), count.load(Ordering::Relaxed)))
            .collect();

        MetricsSnapshot {
            total_requests: self.total_requests(),
            pending_requests: self.pending_requests(),
            success_requests: self.success_requests(),
            responses: self.responses(),
            latencies,
        }
    }
}

/// Decrements the pending gauge on drop, including when the fetch is aborted.
#[derive(Debug)]
pub struct PendingGuard<'a> {
    metrics: &'a FetchMetrics,
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.metrics.pending_requests.fetch_sub(1, Ordering::Relaxed);
        gauge!(REQUESTS_PENDING).decrement(1.0);
    }
}

/// Point-in-time view served by the diagnostics endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct MetricsSnapshot {
    pub total_requests: u64,
    pub pending_requests: i64,
    pub success_requests: u64,
    pub responses: u64,
    pub latencies: BTreeMap<String, u64>,
}

/// Install the Prometheus exporter and its HTTP listener.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    let bounds: Vec<f64> = (0..LATENCY_BUCKETS - 1)
        .map(|k| (1u64 << k) as f64 / 1000.0)
        .collect();

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .set_buckets_for_metric(Matcher::Full(REQUEST_DURATION.to_string()), &bounds)?
        .install()?;

    describe_counter!(REQUESTS_TOTAL, "Origin requests issued");
    describe_gauge!(REQUESTS_PENDING, "Origin requests in flight");
    describe_counter!(REQUESTS_SUCCESS, "Origin requests completed before the deadline");
    describe_counter!(RESPONSES_TOTAL, "Aggregate requests served");
    describe_histogram!(REQUEST_DURATION, "Origin request latency in seconds");

    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}
