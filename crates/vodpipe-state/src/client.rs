//! Firestore REST API client for the correlation state store.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use gcp_auth::{CustomServiceAccount, TokenProvider};
use reqwest::{Client, StatusCode};
use tracing::debug;

use crate::error::{StateStoreError, StateStoreResult};
use crate::metrics::record_request;
use crate::retry::{with_retry, RetryConfig};
use crate::token_cache::TokenCache;
use crate::types::{Document, Value};

/// State store client configuration.
#[derive(Debug, Clone)]
pub struct StateStoreConfig {
    /// GCP project ID
    pub project_id: String,
    /// Database ID (usually "(default)")
    pub database_id: String,
    /// Collection holding processing state records
    pub collection: String,
    /// Emulator URL override; disables auth when set
    pub emulator_url: Option<String>,
    /// Request timeout
    pub timeout: Duration,
    /// Connect timeout
    pub connect_timeout: Duration,
    /// Retry configuration
    pub retry: RetryConfig,
}

impl StateStoreConfig {
    /// Create config from environment variables.
    pub fn from_env() -> StateStoreResult<Self> {
        let project_id = std::env::var("GCP_PROJECT_ID").map_err(|_| {
            StateStoreError::auth_error("GCP_PROJECT_ID must be set to access the state store")
        })?;

        if project_id.is_empty() {
            return Err(StateStoreError::auth_error("GCP_PROJECT_ID cannot be empty"));
        }

        Ok(Self {
            project_id,
            database_id: std::env::var("STATE_STORE_DATABASE_ID")
                .unwrap_or_else(|_| "(default)".to_string()),
            collection: std::env::var("STATE_STORE_COLLECTION")
                .unwrap_or_else(|_| "processing_state".to_string()),
            emulator_url: std::env::var("STATE_STORE_EMULATOR_URL").ok(),
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(5),
            retry: RetryConfig::from_env(),
        })
    }
}

/// Firestore REST API client.
pub struct StateStoreClient {
    http: Client,
    config: StateStoreConfig,
    base_url: String,
    token_cache: Option<Arc<TokenCache>>,
}

impl Clone for StateStoreClient {
    fn clone(&self) -> Self {
        Self {
            http: self.http.clone(),
            config: self.config.clone(),
            base_url: self.base_url.clone(),
            token_cache: self.token_cache.clone(),
        }
    }
}

impl StateStoreClient {
    /// Create a new state store client.
    pub async fn new(config: StateStoreConfig) -> StateStoreResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(10)
            .user_agent(concat!("vodpipe-state/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(StateStoreError::Network)?;

        let (base_url, token_cache) = match &config.emulator_url {
            Some(host) => {
                let base = format!(
                    "{}/v1/projects/{}/databases/{}/documents",
                    host.trim_end_matches('/'),
                    config.project_id,
                    config.database_id
                );
                (base, None)
            }
            None => {
                let auth = Self::create_auth_provider()?;
                let base = format!(
                    "https://firestore.googleapis.com/v1/projects/{}/databases/{}/documents",
                    config.project_id, config.database_id
                );
                (base, Some(Arc::new(TokenCache::new(auth))))
            }
        };

        Ok(Self {
            http,
            config,
            base_url,
            token_cache,
        })
    }

    fn create_auth_provider() -> StateStoreResult<Arc<dyn TokenProvider>> {
        let service_account = CustomServiceAccount::from_env().map_err(|e| {
            StateStoreError::auth_error(format!("Failed to load service account: {}", e))
        })?;

        match service_account {
            Some(sa) => Ok(Arc::new(sa)),
            None => Err(StateStoreError::auth_error(
                "GOOGLE_APPLICATION_CREDENTIALS not set. \
                 Set it to the path of your service account JSON file.",
            )),
        }
    }

    /// Create from environment variables.
    pub async fn from_env() -> StateStoreResult<Self> {
        let config = StateStoreConfig::from_env()?;
        Self::new(config).await
    }

    /// Collection holding processing state records.
    pub fn collection(&self) -> &str {
        &self.config.collection
    }

    async fn get_token(&self) -> StateStoreResult<String> {
        match &self.token_cache {
            Some(cache) => cache.get_token().await,
            // Emulator convention: any non-empty bearer works.
            None => Ok("owner".to_string()),
        }
    }

    fn is_access_token_expired(body: &str) -> bool {
        body.contains("ACCESS_TOKEN_EXPIRED") || body.contains("\"UNAUTHENTICATED\"")
    }

    fn document_path(&self, doc_id: &str) -> String {
        format!("{}/{}/{}", self.base_url, self.config.collection, doc_id)
    }

    /// Get a document by ID. Returns `None` when the record does not exist.
    pub async fn get_document(&self, doc_id: &str) -> StateStoreResult<Option<Document>> {
        let url = self.document_path(doc_id);
        let retry = self.config.retry.clone();

        with_retry(&retry, "get_document", || async {
            let started = Instant::now();
            let mut token = self.get_token().await?;
            let mut response = self.http.get(&url).bearer_auth(&token).send().await?;
            let mut status = response.status();

            if status == StatusCode::UNAUTHORIZED {
                let body = response.text().await.unwrap_or_default();
                if Self::is_access_token_expired(&body) {
                    if let Some(cache) = &self.token_cache {
                        cache.invalidate().await;
                    }
                    token = self.get_token().await?;
                    response = self.http.get(&url).bearer_auth(&token).send().await?;
                    status = response.status();
                } else {
                    return Err(StateStoreError::from_http_status(
                        status.as_u16(),
                        format!("{} failed: {}", url, body),
                    ));
                }
            }

            record_request(
                "get_document",
                status.as_u16(),
                started.elapsed().as_secs_f64() * 1000.0,
            );

            match status {
                StatusCode::OK => {
                    let doc: Document = response.json().await?;
                    Ok(Some(doc))
                }
                StatusCode::NOT_FOUND => Ok(None),
                _ => {
                    let body = response.text().await.unwrap_or_default();
                    Err(StateStoreError::from_http_status(
                        status.as_u16(),
                        format!("{} failed: {}", url, body),
                    ))
                }
            }
        })
        .await
    }

    /// Upsert a document: write the full field set under the given ID,
    /// creating the document when absent.
    ///
    /// A PATCH without an update mask replaces the whole document, so the
    /// record either lands completely or not at all.
    pub async fn upsert_document(
        &self,
        doc_id: &str,
        fields: HashMap<String, Value>,
    ) -> StateStoreResult<Document> {
        let url = self.document_path(doc_id);
        let body = Document::new(fields);
        let retry = self.config.retry.clone();

        with_retry(&retry, "upsert_document", || async {
            let started = Instant::now();
            let mut token = self.get_token().await?;
            let mut response = self
                .http
                .patch(&url)
                .bearer_auth(&token)
                .json(&body)
                .send()
                .await?;
            let mut status = response.status();

            if status == StatusCode::UNAUTHORIZED {
                let body_text = response.text().await.unwrap_or_default();
                if Self::is_access_token_expired(&body_text) {
                    if let Some(cache) = &self.token_cache {
                        cache.invalidate().await;
                    }
                    token = self.get_token().await?;
                    response = self
                        .http
                        .patch(&url)
                        .bearer_auth(&token)
                        .json(&body)
                        .send()
                        .await?;
                    status = response.status();
                } else {
                    return Err(StateStoreError::from_http_status(
                        status.as_u16(),
                        format!("{} failed: {}", url, body_text),
                    ));
                }
            }

            record_request(
                "upsert_document",
                status.as_u16(),
                started.elapsed().as_secs_f64() * 1000.0,
            );

            match status {
                StatusCode::OK => {
                    let doc: Document = response.json().await?;
                    debug!("Upserted state record {}", doc_id);
                    Ok(doc)
                }
                _ => {
                    let body_text = response.text().await.unwrap_or_default();
                    Err(StateStoreError::from_http_status(
                        status.as_u16(),
                        format!("{} failed: {}", url, body_text),
                    ))
                }
            }
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> StateStoreConfig {
        StateStoreConfig {
            project_id: "test-project".to_string(),
            database_id: "(default)".to_string(),
            collection: "processing_state".to_string(),
            emulator_url: Some("http://localhost:8080".to_string()),
            timeout: Duration::from_secs(5),
            connect_timeout: Duration::from_secs(2),
            retry: RetryConfig {
                max_retries: 1,
                base_delay_ms: 10,
                max_delay_ms: 50,
            },
        }
    }

    #[tokio::test]
    async fn emulator_config_skips_auth() {
        let client = StateStoreClient::new(test_config())
            .await
            .expect("create client");

        assert!(client.token_cache.is_none());
        assert!(client.base_url.starts_with("http://localhost:8080/v1/projects/test-project"));
        assert_eq!(client.get_token().await.expect("token"), "owner");
    }

    #[tokio::test]
    async fn document_path_includes_collection() {
        let client = StateStoreClient::new(test_config())
            .await
            .expect("create client");

        assert!(client.document_path("abc123").ends_with("/processing_state/abc123"));
    }
}
