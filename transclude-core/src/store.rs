//! Built-in [`Fetcher`] implementations.
//!
//! - [`MemoryStore`]: a fixed snapshot held in memory. Counts fetches so tests
//!   can assert on fan-out.
//! - [`FsStore`]: a directory on disk laid out like the bucket.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tracing::{debug, error};

use crate::contract::{FetchError, Fetcher};
use crate::logical_path::store_key;

/// In-memory store keyed by store key, like the directory and HTTP stores.
#[derive(Debug, Default)]
pub struct MemoryStore {
    documents: HashMap<String, Vec<u8>>,
    fetches: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, path: &str, body: impl Into<Vec<u8>>) -> Self {
        self.insert(path, body);
        self
    }

    pub fn insert(&mut self, path: &str, body: impl Into<Vec<u8>>) {
        self.documents.insert(store_key(path), body.into());
    }

    /// Number of `get` calls served so far, including misses.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Fetcher for MemoryStore {
    async fn get(&self, path: &str) -> Result<Vec<u8>, FetchError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let key = store_key(path);
        match self.documents.get(&key) {
            Some(body) => Ok(body.clone()),
            None => Err(FetchError::NotFound(key)),
        }
    }
}

/// Store backed by a local directory; object keys map to relative file paths.
#[derive(Debug, Clone)]
pub struct FsStore {
    root: PathBuf,
}

impl FsStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &std::path::Path {
        &self.root
    }
}

#[async_trait]
impl Fetcher for FsStore {
    async fn get(&self, path: &str) -> Result<Vec<u8>, FetchError> {
        let key = store_key(path);
        let file = self.root.join(&key);
        debug!(key = %key, file = %file.display(), "Reading document from directory store");
        match tokio::fs::read(&file).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(FetchError::NotFound(key)),
            Err(e) => {
                error!(error = ?e, file = %file.display(), "Failed to read document from directory store");
                Err(FetchError::from(e))
            }
        }
    }
}
