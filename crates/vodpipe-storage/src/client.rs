//! S3-compatible upload bucket client.

use std::time::Duration;

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_credential_types::Credentials;
use aws_sdk_s3::config::{Builder, Region};
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::Client;
use tracing::{debug, info};

use crate::error::{StorageError, StorageResult};
use crate::source::{BlobSource, SourceBlob};

/// Configuration for the upload bucket client.
#[derive(Debug, Clone)]
pub struct BucketConfig {
    /// S3 API endpoint URL
    pub endpoint_url: String,
    /// Access key ID
    pub access_key_id: String,
    /// Secret access key
    pub secret_access_key: String,
    /// Bucket name
    pub bucket_name: String,
    /// Region ("auto" for R2-style endpoints)
    pub region: String,
}

impl BucketConfig {
    /// Create config from environment variables.
    pub fn from_env() -> StorageResult<Self> {
        Ok(Self {
            endpoint_url: std::env::var("UPLOAD_BUCKET_ENDPOINT_URL")
                .map_err(|_| StorageError::config_error("UPLOAD_BUCKET_ENDPOINT_URL not set"))?,
            access_key_id: std::env::var("UPLOAD_BUCKET_ACCESS_KEY_ID")
                .map_err(|_| StorageError::config_error("UPLOAD_BUCKET_ACCESS_KEY_ID not set"))?,
            secret_access_key: std::env::var("UPLOAD_BUCKET_SECRET_ACCESS_KEY")
                .map_err(|_| StorageError::config_error("UPLOAD_BUCKET_SECRET_ACCESS_KEY not set"))?,
            bucket_name: std::env::var("UPLOAD_BUCKET_NAME")
                .map_err(|_| StorageError::config_error("UPLOAD_BUCKET_NAME not set"))?,
            region: std::env::var("UPLOAD_BUCKET_REGION").unwrap_or_else(|_| "auto".to_string()),
        })
    }
}

/// Upload bucket client.
#[derive(Clone)]
pub struct BucketClient {
    client: Client,
    bucket: String,
}

impl BucketClient {
    /// Create a new bucket client from configuration.
    pub async fn new(config: BucketConfig) -> StorageResult<Self> {
        let credentials = Credentials::new(
            &config.access_key_id,
            &config.secret_access_key,
            None,
            None,
            "upload-bucket",
        );

        let sdk_config = Builder::new()
            .behavior_version(BehaviorVersion::latest())
            .endpoint_url(&config.endpoint_url)
            .region(Region::new(config.region))
            .credentials_provider(credentials)
            .force_path_style(true)
            .build();

        let client = Client::from_conf(sdk_config);

        Ok(Self {
            client,
            bucket: config.bucket_name,
        })
    }

    /// Create from environment variables.
    pub async fn from_env() -> StorageResult<Self> {
        let config = BucketConfig::from_env()?;
        Self::new(config).await
    }

    /// Generate a presigned GET URL for an object.
    pub async fn presign_get(&self, key: &str, expires_in: Duration) -> StorageResult<String> {
        let presign_config = PresigningConfig::expires_in(expires_in)
            .map_err(|e| StorageError::PresignFailed(e.to_string()))?;

        let presigned = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .presigned(presign_config)
            .await
            .map_err(|e| StorageError::PresignFailed(e.to_string()))?;

        Ok(presigned.uri().to_string())
    }

    /// Delete an object.
    pub async fn delete_object(&self, key: &str) -> StorageResult<()> {
        debug!("Deleting {}", key);

        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| StorageError::delete_failed(e.to_string()))?;

        info!("Deleted source object {}", key);
        Ok(())
    }

    /// Check if an object exists.
    pub async fn object_exists(&self, key: &str) -> StorageResult<bool> {
        match self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
        {
            Ok(_) => Ok(true),
            Err(e) => {
                if e.to_string().contains("NotFound") || e.to_string().contains("NoSuchKey") {
                    Ok(false)
                } else {
                    Err(StorageError::AwsSdk(e.to_string()))
                }
            }
        }
    }

    /// Check connectivity by performing a head bucket operation.
    pub async fn check_connectivity(&self) -> StorageResult<()> {
        self.client
            .head_bucket()
            .bucket(&self.bucket)
            .send()
            .await
            .map_err(|e| StorageError::AwsSdk(format!("Bucket connectivity check failed: {}", e)))?;
        Ok(())
    }
}

#[async_trait]
impl BlobSource for BucketClient {
    async fn ingest_url(&self, blob: &SourceBlob, expires_in: Duration) -> StorageResult<String> {
        self.presign_get(&blob.key, expires_in).await
    }

    async fn delete(&self, blob: &SourceBlob) -> StorageResult<()> {
        self.delete_object(&blob.key).await
    }

    async fn exists(&self, blob: &SourceBlob) -> StorageResult<bool> {
        self.object_exists(&blob.key).await
    }
}
