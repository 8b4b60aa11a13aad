//! Recursive include resolution.
//!
//! The [`Resolver`] expands every include directive in a document body by
//! fetching the referenced documents through a [`Fetcher`], resolving those
//! that the [`TranscludePolicy`] accepts, and splicing the results back in.
//!
//! # Responsibilities
//! - Fan out all sibling includes of one document at once and join them with a
//!   fail-fast barrier: the first failure aborts the whole level.
//! - Substitute strictly by directive position, so output never depends on
//!   which fetch finished first and duplicate directives stay independent.
//! - Refuse include cycles and runaway nesting instead of recursing forever.
//! - Optionally bound the whole top-level resolution with a deadline.
//!
//! # Error Handling
//! Every failure surfaces as a [`TranscludeError`]; a failed resolution never
//! yields a partially substituted body.
//!
//! # Navigation
//! - Entrypoints: [`Resolver::resolve`], [`Resolver::resolve_document`]
//! - Construction: [`Resolver::new`], [`Resolver::from_config`]

use std::future::Future;
use std::time::Duration;

use futures::future::{try_join_all, BoxFuture, FutureExt};
use tracing::{debug, error, info, warn};

use crate::config::EngineConfig;
use crate::contract::{ExtensionPolicy, Fetcher, TranscludePolicy};
use crate::directive::{parse_directives, Directive};
use crate::error::TranscludeError;
use crate::logical_path;

pub const DEFAULT_MAX_DEPTH: usize = 16;

/// Resolves include directives against a content store.
pub struct Resolver<F> {
    fetcher: F,
    policy: Box<dyn TranscludePolicy>,
    max_depth: usize,
    timeout: Option<Duration>,
}

impl<F: Fetcher> Resolver<F> {
    /// Resolver with the default `.shtml` policy, depth limit and no deadline.
    pub fn new(fetcher: F) -> Self {
        Self {
            fetcher,
            policy: Box::new(ExtensionPolicy::default()),
            max_depth: DEFAULT_MAX_DEPTH,
            timeout: None,
        }
    }

    pub fn from_config(fetcher: F, config: &EngineConfig) -> Self {
        Self::new(fetcher)
            .with_policy(config.transclude_policy())
            .with_max_depth(config.max_depth)
            .with_timeout(config.timeout())
    }

    pub fn with_policy(mut self, policy: impl TranscludePolicy + 'static) -> Self {
        self.policy = Box::new(policy);
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    pub fn should_transclude(&self, path: &str) -> bool {
        self.policy.should_transclude(path)
    }

    /// Expand all includes in `body`, resolving relative paths against
    /// `parent_dir`.
    ///
    /// A relative `parent_dir` is taken from the store root. A body without
    /// directives is returned unchanged.
    pub async fn resolve(&self, body: &str, parent_dir: &str) -> Result<String, TranscludeError> {
        let dir = logical_path::absolute(parent_dir);
        self.bounded(self.resolve_node(body.to_string(), dir, Vec::new(), 0))
            .await
    }

    /// Fetch the document at `path` and expand it in its own directory.
    ///
    /// The document's path seeds the cycle check, so a page that includes
    /// itself is rejected.
    pub async fn resolve_document(&self, path: &str) -> Result<String, TranscludeError> {
        let path = logical_path::absolute(path);
        self.bounded(async {
            let body = self.fetch_text(&path).await?;
            let dir = logical_path::dirname(&path);
            self.resolve_node(body, dir, vec![path.clone()], 0).await
        })
        .await
    }

    /// Expand `body`, which is already known to be the document at `path`.
    ///
    /// Same as [`Resolver::resolve_document`] without the initial fetch.
    pub async fn resolve_at(&self, body: &str, path: &str) -> Result<String, TranscludeError> {
        let path = logical_path::absolute(path);
        let dir = logical_path::dirname(&path);
        self.bounded(self.resolve_node(body.to_string(), dir, vec![path], 0))
            .await
    }

    async fn bounded<T>(
        &self,
        fut: impl Future<Output = Result<T, TranscludeError>>,
    ) -> Result<T, TranscludeError> {
        match self.timeout {
            Some(timeout) => match tokio::time::timeout(timeout, fut).await {
                Ok(result) => result,
                Err(_) => {
                    error!(?timeout, "Resolution exceeded its deadline");
                    Err(TranscludeError::DeadlineExceeded { timeout })
                }
            },
            None => fut.await,
        }
    }

    /// One node of the resolution tree. `chain` holds the paths from the root
    /// document down to this one.
    fn resolve_node<'a>(
        &'a self,
        body: String,
        dir: String,
        chain: Vec<String>,
        depth: usize,
    ) -> BoxFuture<'a, Result<String, TranscludeError>> {
        async move {
            let directives = parse_directives(&body);
            if directives.is_empty() {
                return Ok(body);
            }
            debug!(dir = %dir, depth, count = directives.len(), "Resolving include directives");

            let includes = directives.iter().map(|d| {
                let target = logical_path::join(&dir, &d.path);
                self.include(target, &chain, depth + 1)
            });
            let values = try_join_all(includes).await?;

            Ok(splice(&body, &directives, &values))
        }
        .boxed()
    }

    async fn include(
        &self,
        target: String,
        chain: &[String],
        depth: usize,
    ) -> Result<String, TranscludeError> {
        if chain.contains(&target) {
            let mut cycle = chain.to_vec();
            cycle.push(target);
            error!(chain = ?cycle, "Include cycle detected");
            return Err(TranscludeError::CycleDetected { chain: cycle });
        }
        if depth > self.max_depth {
            error!(path = %target, depth, max_depth = self.max_depth, "Include nesting too deep");
            return Err(TranscludeError::DepthExceeded {
                depth,
                path: target,
            });
        }

        let body = self.fetch_text(&target).await?;
        if !self.policy.should_transclude(&target) {
            return Ok(body);
        }

        let mut next_chain = chain.to_vec();
        next_chain.push(target.clone());
        let dir = logical_path::dirname(&target);
        self.resolve_node(body, dir, next_chain, depth).await
    }

    async fn fetch_text(&self, path: &str) -> Result<String, TranscludeError> {
        let bytes = match self.fetcher.get(path).await {
            Ok(bytes) => bytes,
            Err(e) => {
                error!(path = %path, error = ?e, "Failed to fetch document");
                return Err(TranscludeError::from_fetch(path, e));
            }
        };
        info!(path = %path, bytes = bytes.len(), "Fetched document");
        Ok(match String::from_utf8(bytes) {
            Ok(text) => text,
            Err(e) => {
                warn!(path = %path, error = %e.utf8_error(), "Document is not valid UTF-8, replacing invalid sequences");
                String::from_utf8_lossy(e.as_bytes()).into_owned()
            }
        })
    }
}

/// Replace each directive's byte range with its resolved value, left to right.
fn splice(body: &str, directives: &[Directive], values: &[String]) -> String {
    let extra: usize = values.iter().map(String::len).sum();
    let mut out = String::with_capacity(body.len() + extra);
    let mut cursor = 0;
    for (directive, value) in directives.iter().zip(values) {
        out.push_str(&body[cursor..directive.range.start]);
        out.push_str(value);
        cursor = directive.range.end;
    }
    out.push_str(&body[cursor..]);
    out
}
