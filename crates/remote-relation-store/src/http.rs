//! HTTP relation store delegating to a server-side transactional RPC.

use crate::{RelationWrite, RemoteRelationStore, RemoteStoreError, RemoteStoreResult};
use async_trait::async_trait;
use relation_model::RelationDocument;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::RwLock;
use std::time::Duration;
use tracing::debug;

/// Remote store configuration.
#[derive(Debug, Clone)]
pub struct RemoteStoreConfig {
    /// Base URL for the relation API.
    pub api_url: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for RemoteStoreConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.stride.fit".to_string(),
            timeout_secs: 30,
        }
    }
}

/// Request payload for the relation toggle RPC.
///
/// The server runs the existence check, document write/delete, and counter
/// adjustment in a single database transaction.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ApplyRelationRequest<'a> {
    relation_id: &'a str,
    document_path: String,
    counter_path: String,
    counter_field: &'a str,
    want_liked: bool,
    document: &'a RelationDocument,
}

/// Response from the relation API.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApplyRelationResponse {
    success: bool,
    #[serde(default)]
    error: Option<String>,
}

/// Relation store backed by the relation API over HTTPS.
///
/// One `apply` is one RPC call; there is no client-side retry here. Failed
/// applies leave the pending cache row in place and the sweeper replays
/// them, so retrying inside the adapter would only duplicate that work.
pub struct HttpRelationStore {
    config: RemoteStoreConfig,
    client: Client,
    /// Behind a lock so a refreshed token can be installed through the
    /// shared handle the engine holds.
    auth_token: RwLock<String>,
}

impl HttpRelationStore {
    /// Create a new HTTP relation store.
    pub fn new(config: RemoteStoreConfig, auth_token: &str) -> RemoteStoreResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            config,
            client,
            auth_token: RwLock::new(auth_token.to_string()),
        })
    }

    /// Update the auth token (e.g. after a refresh). In-flight applies keep
    /// the token they already read; subsequent ones use the new one.
    pub fn set_auth_token(&self, token: &str) {
        *self.auth_token.write().expect("lock poisoned") = token.to_string();
    }
}

#[async_trait]
impl RemoteRelationStore for HttpRelationStore {
    async fn apply(&self, write: &RelationWrite) -> RemoteStoreResult<()> {
        let url = format!("{}/rpc/relation_toggle", self.config.api_url);

        let request = ApplyRelationRequest {
            relation_id: write.relation_id.as_str(),
            document_path: write.document_path(),
            counter_path: write.counter_path(),
            counter_field: write.kind.counter_field(),
            want_liked: write.want_liked,
            document: &write.document,
        };

        debug!(
            url = %url,
            relation_id = %write.relation_id,
            want_liked = write.want_liked,
            "Applying relation write"
        );

        let token = self.auth_token.read().expect("lock poisoned").clone();
        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", token))
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RemoteStoreError::Rejected(format!("HTTP {}: {}", status, body)));
        }

        let result: ApplyRelationResponse = response.json().await?;

        if result.success {
            Ok(())
        } else {
            Err(RemoteStoreError::Rejected(
                result.error.unwrap_or_else(|| "Unknown error".to_string()),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use relation_model::{RelationId, RelationKind};

    #[test]
    fn test_config_default() {
        let config = RemoteStoreConfig::default();
        assert_eq!(config.api_url, "https://api.stride.fit");
        assert_eq!(config.timeout_secs, 30);
    }

    #[test]
    fn test_store_creation() {
        let store = HttpRelationStore::new(RemoteStoreConfig::default(), "test-token");
        assert!(store.is_ok());
    }

    #[test]
    fn test_set_auth_token_through_shared_reference() {
        let store = std::sync::Arc::new(
            HttpRelationStore::new(RemoteStoreConfig::default(), "initial").unwrap(),
        );

        store.set_auth_token("rotated");

        assert_eq!(*store.auth_token.read().unwrap(), "rotated");
    }

    #[tokio::test]
    async fn test_apply_fails_without_server() {
        let config = RemoteStoreConfig {
            api_url: "http://localhost:59999".to_string(),
            timeout_secs: 1,
        };
        let store = HttpRelationStore::new(config, "test-token").unwrap();

        let write = RelationWrite {
            relation_id: RelationId::derive("u1", "p1", RelationKind::Post, None),
            kind: RelationKind::Post,
            target_id: "p1".to_string(),
            parent_id: None,
            want_liked: true,
            document: RelationDocument {
                subject_id: "u1".to_string(),
                target_id: "p1".to_string(),
                parent_id: None,
                created_at: Utc::now(),
            },
        };

        // No server is listening; the transport error must surface, never a
        // silent success
        let result = store.apply(&write).await;
        assert!(result.is_err());
    }
}
