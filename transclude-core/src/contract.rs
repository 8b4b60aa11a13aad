//! # contract: capabilities the resolver consumes
//!
//! This module defines the two seams between the transclusion engine and its
//! environment:
//!
//! - [`Fetcher`]: read-only access to a content store, keyed by logical path.
//! - [`TranscludePolicy`]: decides whether a fetched document is itself
//!   scanned for include directives.
//!
//! ## Mocking & Testing
//! - `Fetcher` is annotated for `mockall`, so tests can script exact fetch
//!   expectations with `MockFetcher` (exported under the `test-export-mocks`
//!   feature).
//! - For content-driven tests prefer [`crate::store::MemoryStore`].
//!
//! ## Adding New Stores
//! - Implement [`Fetcher`] for your store.
//! - Map "missing object" to [`FetchError::NotFound`] and everything else
//!   (transport, auth, throttling) to [`FetchError::Store`].
//! - Retries, if any, belong to the store; the resolver never retries.

use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;

#[allow(unused_imports)]
use mockall::{automock, predicate::*};

pub use crate::error::FetchError;

/// Read-only content store accessor.
///
/// `path` is a normalized, store-absolute logical path such as
/// `/foo/nav.shtml`. Implementations that address objects by key should use
/// [`crate::logical_path::store_key`] to drop the leading slash.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetch the raw bytes of the document at `path`.
    async fn get(&self, path: &str) -> Result<Vec<u8>, FetchError>;
}

#[async_trait]
impl<T: Fetcher + ?Sized> Fetcher for Arc<T> {
    async fn get(&self, path: &str) -> Result<Vec<u8>, FetchError> {
        (**self).get(path).await
    }
}

/// Predicate deciding whether a fetched document is recursively resolved.
pub trait TranscludePolicy: Send + Sync {
    fn should_transclude(&self, path: &str) -> bool;
}

impl<F> TranscludePolicy for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn should_transclude(&self, path: &str) -> bool {
        self(path)
    }
}

/// Transclude documents whose extension is in a configured set.
///
/// Extensions are stored without the leading dot and compared
/// case-sensitively, the way the store compares keys.
#[derive(Debug, Clone)]
pub struct ExtensionPolicy {
    extensions: BTreeSet<String>,
}

impl ExtensionPolicy {
    pub fn new<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            extensions: extensions
                .into_iter()
                .map(|e| e.as_ref().trim_start_matches('.').to_string())
                .collect(),
        }
    }

    pub fn extensions(&self) -> impl Iterator<Item = &str> {
        self.extensions.iter().map(String::as_str)
    }
}

impl Default for ExtensionPolicy {
    fn default() -> Self {
        Self::new(["shtml"])
    }
}

impl TranscludePolicy for ExtensionPolicy {
    fn should_transclude(&self, path: &str) -> bool {
        crate::logical_path::extension(path)
            .map(|ext| self.extensions.contains(ext))
            .unwrap_or(false)
    }
}
