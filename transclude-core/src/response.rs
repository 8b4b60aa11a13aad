//! Response composition for transcluded documents.
//!
//! Headers use the CDN event shape: a map from lower-cased header name to a
//! list of `{ key, value }` entries, where `key` is the display casing.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;

/// Header map keyed by lower-cased header name.
pub type Headers = BTreeMap<String, Vec<HeaderEntry>>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    pub value: String,
}

impl HeaderEntry {
    pub fn new(key: &str, value: impl Into<String>) -> Self {
        Self {
            key: Some(key.to_string()),
            value: value.into(),
        }
    }
}

/// What happens to the headers the request arrived with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeaderPolicy {
    /// Emit only the content-type and cache-control headers.
    #[default]
    Replace,
    /// Keep the original headers and override content-type and cache-control.
    /// Headers describing the unexpanded body ([`BODY_BOUND_HEADERS`]) are
    /// dropped.
    Merge,
}

/// Headers that describe the exact bytes of the unexpanded body.
pub const BODY_BOUND_HEADERS: &[&str] = &["content-length", "content-md5", "etag"];

/// A fully formed response for a transcluded document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeResponse {
    pub body: String,
    pub body_encoding: String,
    pub status: String,
    pub status_description: String,
    pub headers: Headers,
}

pub const CONTENT_TYPE_HTML: &str = "text/html; charset=UTF-8";

#[derive(Debug, Clone)]
pub struct ResponseComposer {
    policy: HeaderPolicy,
    cache_max_age_secs: u64,
}

impl Default for ResponseComposer {
    fn default() -> Self {
        Self {
            policy: HeaderPolicy::Replace,
            cache_max_age_secs: 3600,
        }
    }
}

impl ResponseComposer {
    pub fn new(policy: HeaderPolicy, cache_max_age_secs: u64) -> Self {
        Self {
            policy,
            cache_max_age_secs,
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.header_policy, config.cache_max_age_secs)
    }

    pub fn compose(&self, body: String, original: &Headers) -> EdgeResponse {
        let mut headers = match self.policy {
            HeaderPolicy::Replace => Headers::new(),
            HeaderPolicy::Merge => original
                .iter()
                .filter(|(name, _)| !BODY_BOUND_HEADERS.contains(&name.as_str()))
                .map(|(name, entries)| (name.clone(), entries.clone()))
                .collect(),
        };
        headers.insert(
            "content-type".to_string(),
            vec![HeaderEntry::new("Content-Type", CONTENT_TYPE_HTML)],
        );
        headers.insert(
            "cache-control".to_string(),
            vec![HeaderEntry::new(
                "Cache-Control",
                format!("max-age={}", self.cache_max_age_secs),
            )],
        );

        EdgeResponse {
            body,
            body_encoding: "text".to_string(),
            status: "200".to_string(),
            status_description: "OK".to_string(),
            headers,
        }
    }
}
