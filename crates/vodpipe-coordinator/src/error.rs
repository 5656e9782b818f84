//! Coordinator error types.

use thiserror::Error;

use vodpipe_engine::EngineError;
use vodpipe_queue::QueueError;
use vodpipe_state::StateStoreError;
use vodpipe_storage::StorageError;

pub type CoordinatorResult<T> = Result<T, CoordinatorError>;

#[derive(Debug, Error)]
pub enum CoordinatorError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// The notification endpoint could not be provisioned because its
    /// configuration is bad. Fatal; redelivery will not fix it.
    #[error("Invalid notification endpoint: {0}")]
    InvalidEndpoint(String),

    #[error("Asset registration failed: {0}")]
    Registration(#[source] EngineError),

    /// Transient failure while provisioning the notification endpoint.
    #[error("Endpoint provisioning failed: {0}")]
    EndpointProvisioning(#[source] EngineError),

    /// The engine rejected or failed the job submission. The registered
    /// asset stays behind unreferenced; no compensation is attempted.
    #[error("Job submission failed, asset {asset_id} left unreferenced: {source}")]
    Submission {
        asset_id: String,
        #[source]
        source: EngineError,
    },

    /// The job was accepted but the correlation record was not persisted.
    /// Until a redelivery writes it, the completion callback cannot be
    /// joined back to this request.
    #[error("State record write failed after submission: {0}")]
    StateStoreWrite(#[source] StateStoreError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Queue error: {0}")]
    Queue(#[from] QueueError),
}

impl CoordinatorError {
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    /// Whether redelivering the upload message can succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            CoordinatorError::ConfigError(_) => false,
            CoordinatorError::InvalidEndpoint(_) => false,
            CoordinatorError::Registration(e) => e.is_retryable(),
            CoordinatorError::EndpointProvisioning(e) => e.is_retryable(),
            CoordinatorError::Submission { source, .. } => source.is_retryable(),
            CoordinatorError::StateStoreWrite(e) => e.is_retryable(),
            CoordinatorError::Storage(e) => e.is_retryable(),
            CoordinatorError::Queue(_) => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_endpoint_is_not_retryable() {
        let err = CoordinatorError::InvalidEndpoint("bad scheme".to_string());
        assert!(!err.is_retryable());
    }

    #[test]
    fn submission_retryability_follows_the_engine_error() {
        let transient = CoordinatorError::Submission {
            asset_id: "asset-1".to_string(),
            source: EngineError::ServerError(503, "unavailable".to_string()),
        };
        assert!(transient.is_retryable());

        let rejected = CoordinatorError::Submission {
            asset_id: "asset-1".to_string(),
            source: EngineError::SubmissionRejected("no inputs".to_string()),
        };
        assert!(!rejected.is_retryable());
    }
}
