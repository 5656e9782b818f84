//! State store error types.

use thiserror::Error;

/// Result type for state store operations.
pub type StateStoreResult<T> = Result<T, StateStoreError>;

/// Errors that can occur talking to the correlation state store.
#[derive(Debug, Error)]
pub enum StateStoreError {
    #[error("Authentication failed: {0}")]
    AuthError(String),

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Rate limited, retry after {0}ms")]
    RateLimited(u64),

    #[error("Server error ({0}): {1}")]
    ServerError(u16, String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl StateStoreError {
    pub fn auth_error(msg: impl Into<String>) -> Self {
        Self::AuthError(msg.into())
    }

    pub fn not_found(path: impl Into<String>) -> Self {
        Self::NotFound(path.into())
    }

    pub fn request_failed(msg: impl Into<String>) -> Self {
        Self::RequestFailed(msg.into())
    }

    pub fn invalid_response(msg: impl Into<String>) -> Self {
        Self::InvalidResponse(msg.into())
    }

    /// Classify an HTTP status into an error variant.
    pub fn from_http_status(status: u16, body: String) -> Self {
        match status {
            403 => Self::PermissionDenied(body),
            404 => Self::NotFound(body),
            429 => Self::RateLimited(1000),
            500..=599 => Self::ServerError(status, body),
            _ => Self::RequestFailed(format!("HTTP {}: {}", status, body)),
        }
    }

    /// Check if error is retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            StateStoreError::Network(_)
                | StateStoreError::RateLimited(_)
                | StateStoreError::ServerError(_, _)
        )
    }

    /// Server-suggested retry delay, if any.
    pub fn retry_after_ms(&self) -> Option<u64> {
        match self {
            StateStoreError::RateLimited(ms) => Some(*ms),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_status_classification() {
        assert!(matches!(
            StateStoreError::from_http_status(404, "gone".into()),
            StateStoreError::NotFound(_)
        ));
        assert!(matches!(
            StateStoreError::from_http_status(503, "busy".into()),
            StateStoreError::ServerError(503, _)
        ));
    }

    #[test]
    fn retryability() {
        assert!(StateStoreError::RateLimited(500).is_retryable());
        assert!(StateStoreError::ServerError(500, "x".into()).is_retryable());
        assert!(!StateStoreError::PermissionDenied("no".into()).is_retryable());
        assert!(!StateStoreError::auth_error("bad key").is_retryable());
    }
}
