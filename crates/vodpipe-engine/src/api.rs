//! The seam the coordinator consumes.

use async_trait::async_trait;

use crate::error::EngineResult;
use crate::types::{Asset, EncodeJob, NotificationEndpoint, SubmittedJob};

/// Operations the submission stage needs from the encoding engine.
///
/// Job and task assembly is local (see [`crate::types::EncodeJob`]); only the
/// calls below cross the wire.
#[async_trait]
pub trait EncodingEngine: Send + Sync {
    /// Register an uploaded media file with the engine.
    ///
    /// `source_url` must be readable by the engine for the duration of the
    /// ingest.
    async fn create_asset(&self, title: &str, source_url: &str) -> EngineResult<Asset>;

    /// Tag an asset with an alternate key, as an explicit update.
    ///
    /// Safe to repeat with the same value; redelivered messages re-tag.
    async fn update_asset_alternate_id(
        &self,
        asset_id: &str,
        alternate_id: &str,
    ) -> EngineResult<Asset>;

    /// List all notification endpoints known to the engine.
    async fn list_notification_endpoints(&self) -> EngineResult<Vec<NotificationEndpoint>>;

    /// Create a notification endpoint with a signing credential.
    async fn create_notification_endpoint(
        &self,
        name: &str,
        endpoint_url: &str,
        credential_base64: &str,
    ) -> EngineResult<NotificationEndpoint>;

    /// Submit an assembled job. Returns once the engine accepts it.
    async fn submit_job(&self, job: &EncodeJob) -> EngineResult<SubmittedJob>;
}
