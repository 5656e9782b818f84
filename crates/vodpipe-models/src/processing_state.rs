//! Processing state record carried through the pipeline.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::correlation::CorrelationId;

/// Custom property key carrying a user-supplied title for the upload.
pub const VIDEO_TITLE_PROPERTY: &str = "Video_Title";

/// State record for one logical encode request.
///
/// Created by the upstream trigger that enqueues the upload message, owned by
/// the coordinator for the duration of the submission stage, then persisted
/// into the correlation state store so the webhook-triggered stage can read
/// it back by `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ProcessingState {
    /// Stable correlation key.
    pub id: CorrelationId,

    /// Name of the uploaded source blob.
    pub blob_name: String,

    /// Free-form properties attached by the upstream trigger.
    /// Insertion order is irrelevant.
    #[serde(default)]
    pub custom_properties: HashMap<String, String>,

    /// When the upstream trigger created this record.
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl ProcessingState {
    /// Create a new state record for an uploaded blob.
    pub fn new(id: CorrelationId, blob_name: impl Into<String>) -> Self {
        Self {
            id,
            blob_name: blob_name.into(),
            custom_properties: HashMap::new(),
            created_at: Utc::now(),
        }
    }

    /// Attach a custom property.
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.custom_properties.insert(key.into(), value.into());
        self
    }

    /// User-supplied title, if present and non-empty.
    pub fn custom_title(&self) -> Option<&str> {
        self.custom_properties
            .get(VIDEO_TITLE_PROPERTY)
            .map(String::as_str)
            .filter(|t| !t.is_empty())
    }

    /// Title to register with the encoding engine: the custom title when one
    /// was supplied, otherwise the blob's own name.
    pub fn display_title(&self) -> &str {
        self.custom_title().unwrap_or(&self.blob_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn custom_title_wins_when_present() {
        let state = ProcessingState::new(CorrelationId::from_string("abc123"), "clip.mp4")
            .with_property(VIDEO_TITLE_PROPERTY, "My Clip");

        assert_eq!(state.custom_title(), Some("My Clip"));
        assert_eq!(state.display_title(), "My Clip");
    }

    #[test]
    fn blob_name_is_fallback_title() {
        let state = ProcessingState::new(CorrelationId::from_string("abc123"), "clip.mp4");
        assert_eq!(state.custom_title(), None);
        assert_eq!(state.display_title(), "clip.mp4");
    }

    #[test]
    fn empty_custom_title_falls_back() {
        let state = ProcessingState::new(CorrelationId::from_string("abc123"), "clip.mp4")
            .with_property(VIDEO_TITLE_PROPERTY, "");
        assert_eq!(state.display_title(), "clip.mp4");
    }

    #[test]
    fn processing_state_serde_roundtrip() {
        let state = ProcessingState::new(CorrelationId::from_string("abc123"), "clip.mp4")
            .with_property(VIDEO_TITLE_PROPERTY, "My Clip");

        let json = serde_json::to_string(&state).expect("serialize ProcessingState");
        let back: ProcessingState = serde_json::from_str(&json).expect("deserialize");

        assert_eq!(back.id, state.id);
        assert_eq!(back.blob_name, "clip.mp4");
        assert_eq!(
            back.custom_properties.get(VIDEO_TITLE_PROPERTY).map(String::as_str),
            Some("My Clip")
        );
    }
}
