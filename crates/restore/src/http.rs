//! Overwrite-style restoration over HTTP.

use async_trait::async_trait;
use history_core::types::Snapshot;
use reqwest::Url;

use crate::dispatcher::Restorable;
use crate::error::{RegistryError, RestoreError};

/// Header marking a request as coming from another internal service.
pub const INTERNAL_REQUEST_HEADER: &str = "X-Internal-Request";

/// Value sent in [`INTERNAL_REQUEST_HEADER`].
pub const INTERNAL_REQUEST_VALUE: &str = "history-service";

/// Longest upstream body excerpt kept in an error message.
const MAX_ERROR_BODY_LEN: usize = 500;

/// Restores one entity type by `PUT`-ing the full snapshot to
/// `{collection_url}/{entity_id}` on the owning service.
///
/// Exactly one request per call; no retry.
pub struct HttpRestorer {
    collaborator: String,
    collection_url: Url,
    client: reqwest::Client,
}

impl HttpRestorer {
    /// * `collaborator` - Service name used in logs and error payloads.
    /// * `collection_url` - e.g. `http://localhost:4002/api/v1/menus`.
    /// * `client` - Shared client carrying the per-call timeout.
    pub fn new(
        collaborator: impl Into<String>,
        collection_url: &str,
        client: reqwest::Client,
    ) -> Result<Self, RegistryError> {
        let parsed = Url::parse(collection_url).map_err(|e| RegistryError::InvalidUrl {
            url: collection_url.to_string(),
            reason: e.to_string(),
        })?;
        if parsed.cannot_be_a_base() {
            return Err(RegistryError::InvalidUrl {
                url: collection_url.to_string(),
                reason: "URL cannot have path segments".to_string(),
            });
        }
        Ok(Self {
            collaborator: collaborator.into(),
            collection_url: parsed,
            client,
        })
    }

    /// Resource URL for one entity. The id is percent-encoded as a single
    /// path segment.
    pub fn url_for(&self, entity_id: &str) -> Url {
        let mut url = self.collection_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(entity_id);
        }
        url
    }

    fn upstream(&self, entity_id: &str, status: Option<u16>, message: String) -> RestoreError {
        RestoreError::Upstream {
            collaborator: self.collaborator.clone(),
            entity_id: entity_id.to_string(),
            status,
            message,
        }
    }
}

#[async_trait]
impl Restorable for HttpRestorer {
    async fn restore(
        &self,
        entity_id: &str,
        snapshot: &Snapshot,
    ) -> Result<serde_json::Value, RestoreError> {
        let url = self.url_for(entity_id);

        let response = self
            .client
            .put(url)
            .header(INTERNAL_REQUEST_HEADER, INTERNAL_REQUEST_VALUE)
            .json(snapshot)
            .send()
            .await
            .map_err(|e| {
                let message = if e.is_timeout() {
                    "request timed out".to_string()
                } else {
                    e.to_string()
                };
                self.upstream(entity_id, None, message)
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            self.upstream(entity_id, Some(status.as_u16()), e.to_string())
        })?;

        if !status.is_success() {
            let message = error_message(&body).unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .unwrap_or("upstream error")
                    .to_string()
            });
            return Err(self.upstream(entity_id, Some(status.as_u16()), message));
        }

        unwrap_envelope(&body, snapshot)
            .map_err(|message| self.upstream(entity_id, Some(status.as_u16()), message))
    }
}

// ---- private helpers ----

/// Interpret a 2xx body.
///
/// A `{success, data}` envelope yields `data` (or the sent snapshot when
/// `data` is absent); `success: false` is a failure. Any other JSON body is
/// returned as-is. An empty or non-JSON body means the collaborator accepted
/// the write without echoing it, so the sent snapshot is returned.
fn unwrap_envelope(body: &str, sent: &Snapshot) -> Result<serde_json::Value, String> {
    let echo = || serde_json::Value::Object(sent.clone());

    let Ok(value) = serde_json::from_str::<serde_json::Value>(body) else {
        return Ok(echo());
    };

    let Some(success) = value.get("success").and_then(|s| s.as_bool()) else {
        return Ok(value);
    };

    if !success {
        return Err(error_message(body).unwrap_or_else(|| "collaborator reported failure".into()));
    }

    match value.get("data") {
        Some(data) if !data.is_null() => Ok(data.clone()),
        _ => Ok(echo()),
    }
}

/// Best-effort human message from an upstream body: `message`, then `error`
/// (string or `{message}`), then the raw text.
fn error_message(body: &str) -> Option<String> {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        let from_json = value
            .get("message")
            .and_then(|m| m.as_str())
            .or_else(|| value.get("error").and_then(|e| e.as_str()))
            .or_else(|| {
                value
                    .get("error")
                    .and_then(|e| e.get("message"))
                    .and_then(|m| m.as_str())
            });
        if let Some(message) = from_json {
            return Some(message.to_string());
        }
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.chars().take(MAX_ERROR_BODY_LEN).collect())
    }
}
