//! Engine error types.

use thiserror::Error;

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors that can occur talking to the encoding engine.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Failed to configure engine client: {0}")]
    ConfigError(String),

    #[error("Invalid notification endpoint '{endpoint}': {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },

    #[error("Asset not found: {0}")]
    AssetNotFound(String),

    #[error("Job submission rejected: {0}")]
    SubmissionRejected(String),

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Server error ({0}): {1}")]
    ServerError(u16, String),

    #[error("Resource already exists: {0}")]
    AlreadyExists(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl EngineError {
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    pub fn invalid_endpoint(endpoint: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidEndpoint {
            endpoint: endpoint.into(),
            reason: reason.into(),
        }
    }

    pub fn submission_rejected(msg: impl Into<String>) -> Self {
        Self::SubmissionRejected(msg.into())
    }

    /// Classify an HTTP status into an error variant.
    pub fn from_http_status(status: u16, body: String) -> Self {
        match status {
            404 => Self::AssetNotFound(body),
            409 => Self::AlreadyExists(body),
            500..=599 => Self::ServerError(status, body),
            _ => Self::RequestFailed(format!("HTTP {}: {}", status, body)),
        }
    }

    /// Check if error is retryable.
    ///
    /// Endpoint misconfiguration is fatal; everything network- or
    /// server-shaped is a candidate for message redelivery.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            EngineError::Network(_) | EngineError::ServerError(_, _)
        )
    }
}
