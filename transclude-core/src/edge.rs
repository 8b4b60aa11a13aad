//! Edge request adapter.
//!
//! Maps a CDN origin-response event onto the resolver and maps the result back
//! into a response. Requests for `/` and for documents the transclude policy
//! accepts are expanded; everything else is passed through untouched.
//!
//! Unknown event fields are kept in `extra` maps so a pass-through
//! re-serializes to what came in.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{error, info, info_span, Instrument};
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::contract::Fetcher;
use crate::error::TranscludeError;
use crate::logical_path;
use crate::resolver::Resolver;
use crate::response::{EdgeResponse, Headers, ResponseComposer};

const S3_ORIGIN_SUFFIX: &str = ".s3.amazonaws.com";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EdgeEvent {
    #[serde(rename = "Records")]
    pub records: Vec<EdgeRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EdgeRecord {
    pub cf: CfPayload,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CfPayload {
    pub request: EdgeRequest,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<OriginResponse>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EdgeRequest {
    pub uri: String,
    #[serde(default)]
    pub headers: Headers,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<RequestOrigin>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl EdgeRequest {
    /// Bucket name of an S3 origin, derived from its domain name.
    pub fn origin_bucket(&self) -> Option<&str> {
        let domain = &self.origin.as_ref()?.s3.as_ref()?.domain_name;
        Some(domain.strip_suffix(S3_ORIGIN_SUFFIX).unwrap_or(domain.as_str()))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestOrigin {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub s3: Option<S3Origin>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct S3Origin {
    #[serde(rename = "domainName")]
    pub domain_name: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The response the origin produced, as delivered in the event.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OriginResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(default, skip_serializing_if = "Headers::is_empty")]
    pub headers: Headers,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Result of handling one event.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum EdgeOutcome {
    Transcluded(EdgeResponse),
    /// Not a transcludable document: the origin response, unchanged.
    PassThrough(OriginResponse),
    /// Not transcludable and no response in the event: the request, unchanged.
    PassThroughRequest(EdgeRequest),
}

/// Handles edge events against one content store.
pub struct EdgeHandler<F> {
    resolver: Resolver<F>,
    composer: ResponseComposer,
    index_document: String,
}

impl<F: Fetcher> EdgeHandler<F> {
    pub fn new(resolver: Resolver<F>, composer: ResponseComposer, index_document: &str) -> Self {
        Self {
            resolver,
            composer,
            index_document: index_document.trim_start_matches('/').to_string(),
        }
    }

    pub fn from_config(fetcher: F, config: &EngineConfig) -> Self {
        Self::new(
            Resolver::from_config(fetcher, config),
            ResponseComposer::from_config(config),
            &config.index_document,
        )
    }

    pub fn resolver(&self) -> &Resolver<F> {
        &self.resolver
    }

    /// True when requests for `uri` get their includes expanded.
    pub fn is_transcludable(&self, uri: &str) -> bool {
        uri == "/" || self.resolver.should_transclude(uri)
    }

    /// Logical path of the document a uri refers to; `/` maps to the index.
    pub fn document_path(&self, uri: &str) -> String {
        if uri == "/" {
            format!("/{}", self.index_document)
        } else {
            logical_path::absolute(uri)
        }
    }

    pub async fn handle(&self, event: EdgeEvent) -> Result<EdgeOutcome, TranscludeError> {
        let record = event.records.into_iter().next().ok_or_else(|| {
            error!("Edge event has no records");
            TranscludeError::MalformedEvent("event contains no records".to_string())
        })?;
        let CfPayload {
            request, response, ..
        } = record.cf;

        let span = info_span!("transclude", request_id = %Uuid::new_v4(), uri = %request.uri);
        self.handle_request(request, response).instrument(span).await
    }

    async fn handle_request(
        &self,
        request: EdgeRequest,
        response: Option<OriginResponse>,
    ) -> Result<EdgeOutcome, TranscludeError> {
        if !self.is_transcludable(&request.uri) {
            info!(uri = %request.uri, "Not a transcludable document, passing through");
            return Ok(match response {
                Some(response) => EdgeOutcome::PassThrough(response),
                None => EdgeOutcome::PassThroughRequest(request),
            });
        }

        if let Some(bucket) = request.origin_bucket() {
            info!(bucket = %bucket, "Serving from origin bucket");
        }

        let path = self.document_path(&request.uri);
        let supplied_body = response.as_ref().and_then(|r| r.body.as_deref());
        let resolved = match supplied_body {
            Some(body) => self.resolver.resolve_at(body, &path).await,
            None => self.resolver.resolve_document(&path).await,
        };
        let body = resolved.map_err(|e| {
            error!(uri = %request.uri, error = %e, "Transclusion failed");
            e
        })?;

        let original = match response {
            Some(r) if !r.headers.is_empty() => r.headers,
            _ => request.headers,
        };
        info!(path = %path, bytes = body.len(), "Transclusion complete");
        Ok(EdgeOutcome::Transcluded(self.composer.compose(body, &original)))
    }
}
