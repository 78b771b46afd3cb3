//! Origin fetching.
//!
//! # Responsibilities
//! - Build the shared outbound HTTP client (proxy, user agent)
//! - Perform exactly one GET per URL and buffer the whole body
//! - Turn the outcome into a [`FetchResult`], capturing failures as data

use std::borrow::Cow;

use reqwest::header::CONTENT_TYPE;

use crate::aggregate::data_uri;
use crate::aggregate::types::{FetchError, FetchResult, ResponseMeta};
use crate::config::OriginConfig;

#[derive(Debug, thiserror::Error)]
pub enum ClientBuildError {
    #[error("invalid proxy URL {url}: {source}")]
    Proxy {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to build HTTP client: {0}")]
    Build(#[from] reqwest::Error),
}

/// Build the client shared by every fetch.
///
/// System proxy variables are ignored; only `origin.proxy_url` routes traffic
/// through a proxy.
pub fn build_client(config: &OriginConfig) -> Result<reqwest::Client, ClientBuildError> {
    let mut builder = reqwest::Client::builder()
        .user_agent(config.user_agent.as_str())
        .no_proxy();

    if let Some(url) = config.proxy_url.as_deref() {
        let proxy = reqwest::Proxy::all(url).map_err(|source| ClientBuildError::Proxy {
            url: url.to_string(),
            source,
        })?;
        builder = builder.proxy(proxy);
    }

    Ok(builder.build()?)
}

/// Fetch one URL and encode its body as a data URI.
///
/// Any status code counts as a response; only transport and body read
/// failures produce an error.
pub async fn fetch(client: &reqwest::Client, url: &str) -> FetchResult {
    let response = match client.get(url).send().await {
        Ok(response) => response,
        Err(e) => {
            tracing::debug!(url = %url, error = %e, "Origin request failed");
            return FetchResult::failed(url, FetchError::Transport(e), None);
        }
    };

    let meta = ResponseMeta::new(response.status(), response.headers().clone());

    let body = match response.bytes().await {
        Ok(body) => body,
        Err(e) => {
            tracing::debug!(url = %url, status = %meta.status, error = %e, "Origin body read failed");
            return FetchResult::failed(url, FetchError::Body(e), Some(meta));
        }
    };

    let content_type = meta
        .headers
        .get(CONTENT_TYPE)
        .map(|v| String::from_utf8_lossy(v.as_bytes()))
        .unwrap_or(Cow::Borrowed(""));

    tracing::trace!(url = %url, status = %meta.status, bytes = body.len(), "Origin response read");

    let uri = data_uri::format(&content_type, &body);
    FetchResult::fetched(url, uri, meta)
}
