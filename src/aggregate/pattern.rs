//! Compact URL pattern decoding.
//!
//! Query parameters:
//! - `p`: exactly one prefix, such as `http://s3.amazonaws.com/base/path/00`
//! - `i`: zero or more inner parts, such as `101-26273-x23sn`
//! - `s`: optional suffix, such as `_m.png`, applied to every URL
//!
//! Expansion is plain string concatenation; nothing is validated or normalized.

use url::form_urlencoded;

pub const PREFIX_PARAM: &str = "p";
pub const INNER_PARAM: &str = "i";
pub const SUFFIX_PARAM: &str = "s";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("must contain the (p)refix query parameter")]
    MissingPrefix,
}

/// A decoded prefix/inner/suffix pattern.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UrlPattern {
    pub prefix: String,
    pub inners: Vec<String>,
    pub suffix: String,
}

impl UrlPattern {
    /// Parse a raw (still percent-encoded) query string.
    ///
    /// The first `p` and `s` values win; every `i` value is kept in order.
    pub fn from_query(query: &str) -> Result<Self, DecodeError> {
        let mut prefix: Option<String> = None;
        let mut suffix: Option<String> = None;
        let mut inners = Vec::new();

        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            match key.as_ref() {
                PREFIX_PARAM if prefix.is_none() => prefix = Some(value.into_owned()),
                SUFFIX_PARAM if suffix.is_none() => suffix = Some(value.into_owned()),
                INNER_PARAM => inners.push(value.into_owned()),
                _ => {}
            }
        }

        let prefix = prefix
            .filter(|p| !p.is_empty())
            .ok_or(DecodeError::MissingPrefix)?;

        Ok(Self {
            prefix,
            inners,
            suffix: suffix.unwrap_or_default(),
        })
    }

    /// Expand into absolute URLs, preserving the order of the inner parts.
    pub fn expand(&self) -> Vec<String> {
        if self.inners.is_empty() {
            return vec![format!("{}{}", self.prefix, self.suffix)];
        }

        self.inners
            .iter()
            .map(|inner| format!("{}{}{}", self.prefix, inner, self.suffix))
            .collect()
    }
}

/// Decode a raw query string straight into the list of URLs to fetch.
pub fn decode_urls(query: &str) -> Result<Vec<String>, DecodeError> {
    UrlPattern::from_query(query).map(|pattern| pattern.expand())
}
