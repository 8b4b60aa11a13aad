use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

use crate::contract::ExtensionPolicy;
use crate::response::HeaderPolicy;

/// Engine settings shared by the resolver, the edge handler and the composer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Extensions (without the dot) of documents that are themselves resolved.
    pub transcludable_extensions: Vec<String>,
    /// Document served for the root uri `/` when no body is supplied.
    pub index_document: String,
    pub header_policy: HeaderPolicy,
    pub cache_max_age_secs: u64,
    /// Maximum include nesting below the top-level document.
    pub max_depth: usize,
    /// Deadline for one top-level resolution. `None` leaves it to the runtime.
    pub timeout_ms: Option<u64>,
    /// Extensions that mark a uri as a file for SPA rewriting.
    pub spa_file_extensions: Vec<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            transcludable_extensions: vec!["shtml".to_string()],
            index_document: "index.shtml".to_string(),
            header_policy: HeaderPolicy::Replace,
            cache_max_age_secs: 3600,
            max_depth: 16,
            timeout_ms: None,
            spa_file_extensions: [
                "html", "htm", "shtml", "css", "js", "mjs", "json", "xml", "txt", "map", "png",
                "jpg", "jpeg", "gif", "svg", "ico", "webp", "pdf", "woff", "woff2", "ttf", "eot",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

impl EngineConfig {
    pub fn transclude_policy(&self) -> ExtensionPolicy {
        ExtensionPolicy::new(&self.transcludable_extensions)
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }

    pub fn trace_loaded(&self) {
        info!(
            transcludable = ?self.transcludable_extensions,
            index_document = %self.index_document,
            header_policy = ?self.header_policy,
            max_depth = self.max_depth,
            timeout_ms = ?self.timeout_ms,
            "Loaded EngineConfig"
        );
        debug!(?self, "EngineConfig loaded (full debug)");
    }
}
