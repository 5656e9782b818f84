//! Upload message delivered once per upload event.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use vodpipe_models::ProcessingState;

/// One unit of work: a newly uploaded video awaiting encode submission.
///
/// Enqueued by the upstream trigger when the upload lands in the bucket.
/// Delivery is at-least-once; the coordinator tolerates redelivery.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadMessage {
    /// Processing state record created by the upstream trigger.
    pub state: ProcessingState,
    /// Object key of the uploaded blob in the source bucket.
    pub blob_key: String,
    /// When the message was enqueued.
    pub enqueued_at: DateTime<Utc>,
}

impl UploadMessage {
    /// Create a new upload message.
    pub fn new(state: ProcessingState, blob_key: impl Into<String>) -> Self {
        Self {
            state,
            blob_key: blob_key.into(),
            enqueued_at: Utc::now(),
        }
    }

    /// Idempotency key for deduplication.
    pub fn idempotency_key(&self) -> String {
        format!("submit:{}:{}", self.state.id, self.blob_key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vodpipe_models::CorrelationId;

    #[test]
    fn upload_message_serde_roundtrip() {
        let state = ProcessingState::new(CorrelationId::from_string("abc123"), "clip.mp4");
        let msg = UploadMessage::new(state, "uploads/clip.mp4");

        let json = serde_json::to_string(&msg).expect("serialize UploadMessage");
        let back: UploadMessage = serde_json::from_str(&json).expect("deserialize");

        assert_eq!(back.state.id.as_str(), "abc123");
        assert_eq!(back.blob_key, "uploads/clip.mp4");
    }

    #[test]
    fn idempotency_key_is_stable() {
        let state = ProcessingState::new(CorrelationId::from_string("abc123"), "clip.mp4");
        let msg = UploadMessage::new(state, "uploads/clip.mp4");
        assert_eq!(msg.idempotency_key(), "submit:abc123:uploads/clip.mp4");
    }
}
