//! Result types shared by the fetcher, the engine and the response writer.

use std::collections::hash_map::{self, HashMap};
use std::time::Duration;

use reqwest::header::{AsHeaderName, HeaderMap};
use reqwest::StatusCode;
use serde::ser::{Serialize, SerializeMap, Serializer};

/// Status line and headers received from an origin.
#[derive(Debug, Clone)]
pub struct ResponseMeta {
    pub status: StatusCode,
    pub headers: HeaderMap,
}

impl ResponseMeta {
    pub fn new(status: StatusCode, headers: HeaderMap) -> Self {
        Self { status, headers }
    }

    /// First value of a header, if present and valid visible ASCII.
    pub fn header<K: AsHeaderName>(&self, name: K) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

/// Why a single origin fetch produced no data URI.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("transport error: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("body read error: {0}")]
    Body(#[source] reqwest::Error),

    #[error("timeout {deadline:?}")]
    Timeout { deadline: Duration },
}

impl FetchError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, FetchError::Timeout { .. })
    }
}

/// Outcome of fetching one URL.
#[derive(Debug)]
pub enum FetchOutcome {
    Fetched {
        data_uri: String,
        response: ResponseMeta,
    },
    Failed {
        error: FetchError,
        /// Present when the status line and headers arrived before the failure.
        response: Option<ResponseMeta>,
    },
}

/// One entry of a [`ResultSet`], keyed by the exact URL that was requested.
#[derive(Debug)]
pub struct FetchResult {
    request_uri: String,
    outcome: FetchOutcome,
}

impl FetchResult {
    pub fn fetched(request_uri: impl Into<String>, data_uri: String, response: ResponseMeta) -> Self {
        Self {
            request_uri: request_uri.into(),
            outcome: FetchOutcome::Fetched { data_uri, response },
        }
    }

    pub fn failed(
        request_uri: impl Into<String>,
        error: FetchError,
        response: Option<ResponseMeta>,
    ) -> Self {
        Self {
            request_uri: request_uri.into(),
            outcome: FetchOutcome::Failed { error, response },
        }
    }

    /// Placeholder installed before any fetch starts.
    pub fn timed_out(request_uri: impl Into<String>, deadline: Duration) -> Self {
        Self::failed(request_uri, FetchError::Timeout { deadline }, None)
    }

    pub fn request_uri(&self) -> &str {
        &self.request_uri
    }

    pub fn outcome(&self) -> &FetchOutcome {
        &self.outcome
    }

    pub fn is_success(&self) -> bool {
        matches!(self.outcome, FetchOutcome::Fetched { .. })
    }

    pub fn data_uri(&self) -> Option<&str> {
        match &self.outcome {
            FetchOutcome::Fetched { data_uri, .. } => Some(data_uri),
            FetchOutcome::Failed { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&FetchError> {
        match &self.outcome {
            FetchOutcome::Fetched { .. } => None,
            FetchOutcome::Failed { error, .. } => Some(error),
        }
    }

    pub fn response(&self) -> Option<&ResponseMeta> {
        match &self.outcome {
            FetchOutcome::Fetched { response, .. } => Some(response),
            FetchOutcome::Failed { response, .. } => response.as_ref(),
        }
    }
}

/// Serializes as `{"uri": ...}` on success and `{"err": ...}` on failure.
impl Serialize for FetchResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        match &self.outcome {
            FetchOutcome::Fetched { data_uri, .. } => map.serialize_entry("uri", data_uri)?,
            FetchOutcome::Failed { error, .. } => map.serialize_entry("err", &error.to_string())?,
        }
        map.end()
    }
}

/// Mapping from requested URL to its [`FetchResult`].
///
/// Holds exactly one entry per distinct requested URL; duplicates in the
/// request collapse onto the same key.
#[derive(Debug, Default, serde::Serialize)]
#[serde(transparent)]
pub struct ResultSet {
    entries: HashMap<String, FetchResult>,
}

impl ResultSet {
    /// Seed one timeout placeholder per URL.
    pub fn with_timeouts<'a, I>(urls: I, deadline: Duration) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        urls.into_iter()
            .map(|url| FetchResult::timed_out(url, deadline))
            .collect()
    }

    /// Overwrite the entry for the result's URL.
    pub fn insert(&mut self, result: FetchResult) {
        self.entries.insert(result.request_uri.clone(), result);
    }

    pub fn get(&self, url: &str) -> Option<&FetchResult> {
        self.entries.get(url)
    }

    pub fn contains(&self, url: &str) -> bool {
        self.entries.contains_key(url)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn urls(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> hash_map::Values<'_, String, FetchResult> {
        self.entries.values()
    }
}

impl FromIterator<FetchResult> for ResultSet {
    fn from_iter<I: IntoIterator<Item = FetchResult>>(iter: I) -> Self {
        let mut set = ResultSet::default();
        for result in iter {
            set.insert(result);
        }
        set
    }
}

impl<'a> IntoIterator for &'a ResultSet {
    type Item = &'a FetchResult;
    type IntoIter = hash_map::Values<'a, String, FetchResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.values()
    }
}
