//! Correlation store seam and its Firestore-backed implementation.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::info;

use vodpipe_models::{CorrelationId, ProcessingState};

use crate::client::StateStoreClient;
use crate::error::{StateStoreError, StateStoreResult};
use crate::types::{Document, Value};

/// Durable mapping from correlation id to processing state record.
///
/// The submission stage writes through this seam; the webhook-triggered stage
/// reads the record back by id to resume the logical request.
#[async_trait]
pub trait CorrelationStore: Send + Sync {
    /// Write the full record under its correlation id, creating or replacing.
    async fn upsert(&self, state: &ProcessingState) -> StateStoreResult<()>;

    /// Read a record back by correlation id.
    async fn get(&self, id: &CorrelationId) -> StateStoreResult<Option<ProcessingState>>;
}

/// Map a state record to Firestore document fields.
fn state_to_fields(state: &ProcessingState) -> HashMap<String, Value> {
    let mut fields = HashMap::new();
    fields.insert("id".to_string(), Value::string(state.id.as_str()));
    fields.insert("blobName".to_string(), Value::string(&state.blob_name));

    let props: HashMap<String, Value> = state
        .custom_properties
        .iter()
        .map(|(k, v)| (k.clone(), Value::string(v)))
        .collect();
    fields.insert("customProperties".to_string(), Value::map(props));

    fields.insert(
        "createdAt".to_string(),
        Value::TimestampValue(state.created_at.to_rfc3339()),
    );
    fields
}

/// Map a Firestore document back to a state record.
fn state_from_document(doc: &Document) -> StateStoreResult<ProcessingState> {
    let fields = doc
        .fields
        .as_ref()
        .ok_or_else(|| StateStoreError::invalid_response("document has no fields"))?;

    let id = fields
        .get("id")
        .and_then(Value::as_string)
        .ok_or_else(|| StateStoreError::invalid_response("missing id field"))?;

    let blob_name = fields
        .get("blobName")
        .and_then(Value::as_string)
        .ok_or_else(|| StateStoreError::invalid_response("missing blobName field"))?;

    let custom_properties = fields
        .get("customProperties")
        .and_then(Value::as_map)
        .map(|m| {
            m.iter()
                .filter_map(|(k, v)| v.as_string().map(|s| (k.clone(), s.to_string())))
                .collect()
        })
        .unwrap_or_default();

    let created_at = fields
        .get("createdAt")
        .and_then(|v| match v {
            Value::TimestampValue(t) => DateTime::parse_from_rfc3339(t).ok(),
            _ => None,
        })
        .map(|t| t.with_timezone(&Utc))
        .unwrap_or_else(Utc::now);

    Ok(ProcessingState {
        id: CorrelationId::from_string(id),
        blob_name: blob_name.to_string(),
        custom_properties,
        created_at,
    })
}

#[async_trait]
impl CorrelationStore for StateStoreClient {
    async fn upsert(&self, state: &ProcessingState) -> StateStoreResult<()> {
        self.upsert_document(state.id.as_str(), state_to_fields(state))
            .await?;

        info!(
            correlation_id = %state.id,
            blob_name = %state.blob_name,
            "Persisted processing state record"
        );
        Ok(())
    }

    async fn get(&self, id: &CorrelationId) -> StateStoreResult<Option<ProcessingState>> {
        match self.get_document(id.as_str()).await? {
            Some(doc) => Ok(Some(state_from_document(&doc)?)),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vodpipe_models::VIDEO_TITLE_PROPERTY;

    #[test]
    fn field_mapping_roundtrip() {
        let state = ProcessingState::new(CorrelationId::from_string("abc123"), "clip.mp4")
            .with_property(VIDEO_TITLE_PROPERTY, "My Clip");

        let fields = state_to_fields(&state);
        let doc = Document::new(fields);
        let back = state_from_document(&doc).expect("map back");

        assert_eq!(back.id.as_str(), "abc123");
        assert_eq!(back.blob_name, "clip.mp4");
        assert_eq!(
            back.custom_properties.get(VIDEO_TITLE_PROPERTY).map(String::as_str),
            Some("My Clip")
        );
    }

    #[test]
    fn missing_blob_name_is_invalid() {
        let mut fields = HashMap::new();
        fields.insert("id".to_string(), Value::string("abc123"));
        let doc = Document::new(fields);

        let err = state_from_document(&doc).unwrap_err();
        assert!(matches!(err, StateStoreError::InvalidResponse(_)));
    }

    #[test]
    fn properties_survive_empty_map() {
        let state = ProcessingState::new(CorrelationId::from_string("abc123"), "clip.mp4");
        let doc = Document::new(state_to_fields(&state));
        let back = state_from_document(&doc).expect("map back");
        assert!(back.custom_properties.is_empty());
    }
}
