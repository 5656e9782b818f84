//! Encoding engine REST API client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::Serialize;
use tracing::{debug, info};

use crate::api::EncodingEngine;
use crate::error::{EngineError, EngineResult};
use crate::types::{Asset, EncodeJob, NotificationEndpoint, SubmittedJob};

/// Engine client configuration.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Base URL of the engine's REST API.
    pub api_url: String,
    /// API key sent as a bearer token.
    pub api_key: String,
    /// Request timeout.
    pub timeout: Duration,
    /// Connect timeout.
    pub connect_timeout: Duration,
}

impl EngineConfig {
    /// Create config from environment variables.
    pub fn from_env() -> EngineResult<Self> {
        Ok(Self {
            api_url: std::env::var("ENGINE_API_URL")
                .map_err(|_| EngineError::config_error("ENGINE_API_URL not set"))?,
            api_key: std::env::var("ENGINE_API_KEY")
                .map_err(|_| EngineError::config_error("ENGINE_API_KEY not set"))?,
            timeout: Duration::from_secs(
                std::env::var("ENGINE_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(60),
            ),
            connect_timeout: Duration::from_secs(5),
        })
    }
}

/// REST client for the encoding engine.
#[derive(Clone)]
pub struct EngineClient {
    http: Client,
    base_url: String,
    api_key: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateAssetRequest<'a> {
    name: &'a str,
    source_url: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct UpdateAssetRequest<'a> {
    alternate_id: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateEndpointRequest<'a> {
    name: &'a str,
    endpoint_url: &'a str,
    credential: &'a str,
}

#[derive(Debug, serde::Deserialize)]
struct ListEndpointsResponse {
    endpoints: Vec<NotificationEndpoint>,
}

impl EngineClient {
    /// Create a new engine client.
    pub fn new(config: EngineConfig) -> EngineResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .user_agent(concat!("vodpipe-engine/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(EngineError::Network)?;

        Ok(Self {
            http,
            base_url: config.api_url.trim_end_matches('/').to_string(),
            api_key: config.api_key,
        })
    }

    /// Create from environment variables.
    pub fn from_env() -> EngineResult<Self> {
        Self::new(EngineConfig::from_env()?)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn read_error(url: &str, response: Response) -> EngineError {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        EngineError::from_http_status(status, format!("{} failed: {}", url, body))
    }
}

#[async_trait]
impl EncodingEngine for EngineClient {
    async fn create_asset(&self, title: &str, source_url: &str) -> EngineResult<Asset> {
        let url = self.url("/v1/assets");
        debug!(title, "Registering asset with engine");

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&CreateAssetRequest {
                name: title,
                source_url,
            })
            .send()
            .await?;

        match response.status() {
            StatusCode::OK | StatusCode::CREATED => {
                let asset: Asset = response.json().await?;
                info!(asset_id = %asset.id, title, "Registered asset");
                Ok(asset)
            }
            _ => Err(Self::read_error(&url, response).await),
        }
    }

    async fn update_asset_alternate_id(
        &self,
        asset_id: &str,
        alternate_id: &str,
    ) -> EngineResult<Asset> {
        let url = self.url(&format!("/v1/assets/{}", asset_id));

        let response = self
            .http
            .patch(&url)
            .bearer_auth(&self.api_key)
            .json(&UpdateAssetRequest { alternate_id })
            .send()
            .await?;

        match response.status() {
            StatusCode::OK => {
                let asset: Asset = response.json().await?;
                debug!(asset_id, alternate_id, "Tagged asset with alternate id");
                Ok(asset)
            }
            _ => Err(Self::read_error(&url, response).await),
        }
    }

    async fn list_notification_endpoints(&self) -> EngineResult<Vec<NotificationEndpoint>> {
        let url = self.url("/v1/notification-endpoints");

        let response = self.http.get(&url).bearer_auth(&self.api_key).send().await?;

        match response.status() {
            StatusCode::OK => {
                let list: ListEndpointsResponse = response.json().await?;
                Ok(list.endpoints)
            }
            _ => Err(Self::read_error(&url, response).await),
        }
    }

    async fn create_notification_endpoint(
        &self,
        name: &str,
        endpoint_url: &str,
        credential_base64: &str,
    ) -> EngineResult<NotificationEndpoint> {
        let url = self.url("/v1/notification-endpoints");

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&CreateEndpointRequest {
                name,
                endpoint_url,
                credential: credential_base64,
            })
            .send()
            .await?;

        match response.status() {
            StatusCode::OK | StatusCode::CREATED => {
                let endpoint: NotificationEndpoint = response.json().await?;
                info!(endpoint_id = %endpoint.id, name, "Created notification endpoint");
                Ok(endpoint)
            }
            _ => Err(Self::read_error(&url, response).await),
        }
    }

    async fn submit_job(&self, job: &EncodeJob) -> EngineResult<SubmittedJob> {
        let url = self.url("/v1/jobs");
        debug!(job_name = %job.name, tasks = job.tasks.len(), "Submitting encode job");

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(job)
            .send()
            .await?;

        match response.status() {
            StatusCode::OK | StatusCode::CREATED | StatusCode::ACCEPTED => {
                let submitted: SubmittedJob = response.json().await?;
                info!(job_id = %submitted.id, state = %submitted.state, "Engine accepted job");
                Ok(submitted)
            }
            StatusCode::UNPROCESSABLE_ENTITY => {
                let body = response.text().await.unwrap_or_default();
                Err(EngineError::submission_rejected(body))
            }
            _ => Err(Self::read_error(&url, response).await),
        }
    }
}
