//! Concurrent fan-out/fan-in of origin fetches against a deadline.
//!
//! # Responsibilities
//! - Seed one timeout placeholder per requested URL
//! - Spawn one instrumented fetch task per distinct URL
//! - Collect results until every task delivered or the deadline fired
//!
//! # Design Decisions
//! - The coordinating task is the only writer of the ResultSet
//! - Duplicate URLs share one entry and are fetched once
//! - The completion channel holds one slot per task, so late senders never block
//! - Stragglers are detached by default; `StragglerPolicy::Abort` aborts them
//! - Fetch concurrency is unbounded unless a limit is configured

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinHandle;

use crate::aggregate::fetcher::fetch;
use crate::aggregate::types::ResultSet;
use crate::config::StragglerPolicy;
use crate::observability::metrics::FetchMetrics;

/// Fetches sets of origin URLs with a shared client and metrics collector.
#[derive(Clone)]
pub struct Aggregator {
    client: reqwest::Client,
    metrics: Arc<FetchMetrics>,
    fetch_limit: Option<Arc<Semaphore>>,
    straggler_policy: StragglerPolicy,
}

impl Aggregator {
    pub fn new(client: reqwest::Client, metrics: Arc<FetchMetrics>) -> Self {
        Self {
            client,
            metrics,
            fetch_limit: None,
            straggler_policy: StragglerPolicy::default(),
        }
    }

    /// Cap the number of origin fetches in flight across all aggregate requests.
    pub fn with_fetch_limit(mut self, limit: Option<usize>) -> Self {
        self.fetch_limit = limit.map(|permits| Arc::new(Semaphore::new(permits)));
        self
    }

    pub fn with_straggler_policy(mut self, policy: StragglerPolicy) -> Self {
        self.straggler_policy = policy;
        self
    }

    pub fn metrics(&self) -> &Arc<FetchMetrics> {
        &self.metrics
    }

    /// Fetch every URL concurrently and return whatever completed within
    /// `deadline`. URLs still outstanding keep their timeout placeholder.
    pub async fn get_all<S: AsRef<str>>(&self, urls: &[S], deadline: Duration) -> ResultSet {
        self.metrics.record_response();

        let mut results = ResultSet::with_timeouts(urls.iter().map(AsRef::as_ref), deadline);
        if results.is_empty() {
            return results;
        }

        let targets: Vec<String> = results.urls().map(str::to_owned).collect();
        let expected = targets.len();
        let (tx, mut rx) = mpsc::channel(expected);

        let tasks: Vec<JoinHandle<()>> = targets
            .into_iter()
            .map(|url| {
                let tx = tx.clone();
                let client = self.client.clone();
                let metrics = self.metrics.clone();
                let limit = self.fetch_limit.clone();

                tokio::spawn(async move {
                    let _permit = match limit {
                        Some(semaphore) => semaphore.acquire_owned().await.ok(),
                        None => None,
                    };
                    let result = metrics.instrument(fetch(&client, &url)).await;
                    // The receiver is gone once the deadline fired.
                    let _ = tx.send(result).await;
                })
            })
            .collect();
        drop(tx);

        let timer = tokio::time::sleep(deadline);
        tokio::pin!(timer);

        let mut received = 0;
        while received < expected {
            tokio::select! {
                delivered = rx.recv() => match delivered {
                    Some(result) => {
                        results.insert(result);
                        self.metrics.record_success();
                        received += 1;
                    }
                    None => break,
                },
                _ = &mut timer => {
                    tracing::debug!(
                        deadline_ms = deadline.as_millis() as u64,
                        outstanding = expected - received,
                        "Aggregate deadline reached"
                    );
                    break;
                }
            }
        }

        if received < expected && self.straggler_policy == StragglerPolicy::Abort {
            for task in &tasks {
                task.abort();
            }
        }

        results
    }
}
