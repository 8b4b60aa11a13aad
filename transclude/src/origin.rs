#![doc = "HTTP origin store: bridges the core `Fetcher` contract to an S3-style object endpoint."]
//
//! # HTTP Origin
//!
//! [`HttpOrigin`] reads documents with plain `GET <base_url>/<key>` requests,
//! the way a website bucket is served. The key is the logical path without its
//! leading slash.
//!
//! - `404` and `403` mean the object does not exist (buckets without list
//!   permission answer `403` for missing keys).
//! - Any other non-success status, and any transport error, is a store error.
//!
//! Construct it from a config ([`build_fetcher`]) or from the bucket named in
//! an edge event ([`HttpOrigin::for_bucket`]).

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::StatusCode;
use transclude_core::contract::{FetchError, Fetcher};
use transclude_core::logical_path::store_key;
use transclude_core::store::FsStore;

use crate::load_config::StoreConfig;

pub struct HttpOrigin {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl HttpOrigin {
    pub fn new(base_url: &str, token: Option<String>) -> Self {
        tracing::info!(
            base_url = %base_url,
            token_set = token.is_some(),
            "Initialized HttpOrigin"
        );
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        }
    }

    /// Origin for an S3 website bucket by name.
    pub fn for_bucket(bucket: &str, token: Option<String>) -> Self {
        Self::new(&format!("https://{bucket}.s3.amazonaws.com"), token)
    }

    pub fn object_url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, store_key(path))
    }
}

#[async_trait]
impl Fetcher for HttpOrigin {
    async fn get(&self, path: &str) -> Result<Vec<u8>, FetchError> {
        let url = self.object_url(path);
        tracing::info!(url = %url, "Fetch from origin");

        let mut request = self.client.get(&url);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| {
            tracing::error!(error = ?e, url = %url, "Failed to reach origin");
            FetchError::Store(Box::new(e))
        })?;

        match response.status() {
            status if status.is_success() => {
                let bytes = response.bytes().await.map_err(|e| {
                    tracing::error!(error = ?e, url = %url, "Failed to read origin response body");
                    FetchError::Store(Box::new(e))
                })?;
                Ok(bytes.to_vec())
            }
            StatusCode::NOT_FOUND | StatusCode::FORBIDDEN => {
                tracing::info!(url = %url, status = %response.status(), "Origin has no such object");
                Err(FetchError::NotFound(store_key(path)))
            }
            status => {
                tracing::error!(url = %url, status = %status, "Origin returned error");
                Err(FetchError::Store(
                    format!("origin returned {status} for {url}").into(),
                ))
            }
        }
    }
}

/// Build the fetcher a config describes.
pub fn build_fetcher(store: &StoreConfig) -> Arc<dyn Fetcher> {
    match store {
        StoreConfig::Fs { root } => Arc::new(FsStore::new(root.clone())),
        StoreConfig::Http { base_url, token } => Arc::new(HttpOrigin::new(base_url, token.clone())),
    }
}
