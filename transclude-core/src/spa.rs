//! Single-page-app uri rewriting.
//!
//! Directory-like uris are rewritten to the `index.html` inside them so the
//! store can serve them. A uri names a file only when its last segment ends in
//! one of the configured extensions; a dot alone (`/1999.024`) is not enough.

use std::collections::BTreeSet;

use tracing::debug;

use crate::config::EngineConfig;
use crate::logical_path;

pub const SPA_INDEX: &str = "index.html";

#[derive(Debug, Clone)]
pub struct SpaRewriter {
    file_extensions: BTreeSet<String>,
}

impl SpaRewriter {
    pub fn new<I, S>(file_extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            file_extensions: file_extensions
                .into_iter()
                .map(|e| e.as_ref().trim_start_matches('.').to_ascii_lowercase())
                .collect(),
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(&config.spa_file_extensions)
    }

    pub fn is_file(&self, uri: &str) -> bool {
        logical_path::extension(uri)
            .map(|ext| self.file_extensions.contains(&ext.to_ascii_lowercase()))
            .unwrap_or(false)
    }

    pub fn rewrite(&self, uri: &str) -> String {
        let rewritten = if uri.is_empty() {
            SPA_INDEX.to_string()
        } else if uri.ends_with('/') {
            format!("{uri}{SPA_INDEX}")
        } else if self.is_file(uri) {
            uri.to_string()
        } else {
            format!("{uri}/{SPA_INDEX}")
        };
        debug!(uri = %uri, rewritten = %rewritten, "Rewrote SPA uri");
        rewritten
    }
}

impl Default for SpaRewriter {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}
