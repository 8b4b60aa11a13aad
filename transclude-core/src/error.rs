//! Error types for fetching and resolving documents.

use std::time::Duration;
use thiserror::Error;

/// Boxed error used by store implementations for transport failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Failure reported by a [`crate::contract::Fetcher`].
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("document not found: {0}")]
    NotFound(String),

    #[error("store error: {0}")]
    Store(#[source] BoxError),
}

impl From<std::io::Error> for FetchError {
    fn from(e: std::io::Error) -> Self {
        FetchError::Store(Box::new(e))
    }
}

/// Failure of a resolution or of an edge request as a whole.
///
/// Any of these aborts the top-level request: the engine never returns a
/// partially substituted document.
#[derive(Debug, Error)]
pub enum TranscludeError {
    #[error("included document `{path}` not found")]
    NotFound { path: String },

    #[error("store error while fetching `{path}`")]
    Store {
        path: String,
        #[source]
        source: BoxError,
    },

    #[error("include cycle detected: {}", chain.join(" -> "))]
    CycleDetected { chain: Vec<String> },

    #[error("include depth {depth} exceeded at `{path}`")]
    DepthExceeded { depth: usize, path: String },

    #[error("resolution did not finish within {timeout:?}")]
    DeadlineExceeded { timeout: Duration },

    #[error("malformed edge event: {0}")]
    MalformedEvent(String),
}

impl TranscludeError {
    /// Attach the requested path to a store-level failure.
    pub fn from_fetch(path: &str, err: FetchError) -> Self {
        match err {
            FetchError::NotFound(_) => TranscludeError::NotFound {
                path: path.to_string(),
            },
            FetchError::Store(source) => TranscludeError::Store {
                path: path.to_string(),
                source,
            },
        }
    }
}
