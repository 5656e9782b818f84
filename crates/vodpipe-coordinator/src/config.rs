//! Coordinator configuration.

use std::time::Duration;

use vodpipe_engine::DEFAULT_JOB_PRIORITY;

use crate::error::{CoordinatorError, CoordinatorResult};

/// Coordinator configuration.
#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    /// Callback URL the engine delivers completion notifications to
    pub callback_url: String,
    /// Base64-encoded HMAC key handed to the engine at endpoint creation
    pub signing_key_base64: String,
    /// Logical name of the notification endpoint (one per name)
    pub endpoint_name: String,
    /// Named encode preset for the single task
    pub encode_preset: String,
    /// Task priority on the engine scale
    pub job_priority: i32,
    /// Lifetime of the presigned ingest URL handed to the engine
    pub ingest_url_ttl: Duration,
    /// Maximum concurrent upload messages in flight
    pub max_concurrent_messages: usize,
    /// Graceful shutdown timeout
    pub shutdown_timeout: Duration,
    /// How often to scan for orphaned pending messages
    pub claim_interval: Duration,
    /// Minimum idle time before a pending message can be claimed (crash recovery)
    pub claim_min_idle: Duration,
}

impl CoordinatorConfig {
    /// Create config from environment variables.
    ///
    /// `CALLBACK_URL` and `CALLBACK_SIGNING_KEY` have no sensible defaults
    /// and are required.
    pub fn from_env() -> CoordinatorResult<Self> {
        let callback_url = std::env::var("CALLBACK_URL")
            .map_err(|_| CoordinatorError::config_error("CALLBACK_URL not set"))?;
        let signing_key_base64 = std::env::var("CALLBACK_SIGNING_KEY")
            .map_err(|_| CoordinatorError::config_error("CALLBACK_SIGNING_KEY not set"))?;

        Ok(Self {
            callback_url,
            signing_key_base64,
            endpoint_name: std::env::var("NOTIFICATION_ENDPOINT_NAME")
                .unwrap_or_else(|_| "encode-complete".to_string()),
            encode_preset: std::env::var("ENCODE_PRESET")
                .unwrap_or_else(|_| "h264-multi-bitrate-720p".to_string()),
            job_priority: std::env::var("JOB_PRIORITY")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_JOB_PRIORITY),
            ingest_url_ttl: Duration::from_secs(
                std::env::var("INGEST_URL_TTL_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(3600),
            ),
            max_concurrent_messages: std::env::var("COORDINATOR_MAX_CONCURRENT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(4),
            shutdown_timeout: Duration::from_secs(
                std::env::var("COORDINATOR_SHUTDOWN_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(30),
            ),
            claim_interval: Duration::from_secs(
                std::env::var("COORDINATOR_CLAIM_INTERVAL_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(30),
            ),
            claim_min_idle: Duration::from_secs(
                std::env::var("COORDINATOR_CLAIM_MIN_IDLE_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(300),
            ),
        })
    }
}

#[cfg(test)]
impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            callback_url: "https://hooks.example.com/encode".to_string(),
            signing_key_base64: String::new(),
            endpoint_name: "encode-complete".to_string(),
            encode_preset: "h264-multi-bitrate-720p".to_string(),
            job_priority: DEFAULT_JOB_PRIORITY,
            ingest_url_ttl: Duration::from_secs(3600),
            max_concurrent_messages: 4,
            shutdown_timeout: Duration::from_secs(30),
            claim_interval: Duration::from_secs(30),
            claim_min_idle: Duration::from_secs(300),
        }
    }
}
