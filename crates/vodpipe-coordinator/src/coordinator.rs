//! Encode submission stage.
//!
//! For each upload message: register the source as an engine asset tagged
//! with the correlation id, make sure the completion callback endpoint
//! exists, consume the source blob, assemble a single-task encode job,
//! submit it, and persist the correlation record the webhook stage joins on.

use std::sync::Arc;

use vodpipe_engine::{
    EncodeJob, EncodeTask, EncodingEngine, EndpointRegistry, EngineError, CallbackSigner,
    TargetJobStates,
};
use vodpipe_models::{CorrelationId, ProcessingState};
use vodpipe_state::CorrelationStore;
use vodpipe_storage::{BlobSource, SourceBlob};

use crate::config::CoordinatorConfig;
use crate::error::{CoordinatorError, CoordinatorResult};
use crate::logging::StageLogger;

/// What one successful submission produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionReceipt {
    pub correlation_id: CorrelationId,
    pub asset_id: String,
    pub endpoint_id: String,
    pub job_id: String,
    pub output_asset_name: String,
}

/// The submission stage over its three external seams.
pub struct StageCoordinator<E, B, S>
where
    E: EncodingEngine + ?Sized,
    B: BlobSource + ?Sized,
    S: CorrelationStore + ?Sized,
{
    engine: Arc<E>,
    blobs: Arc<B>,
    store: Arc<S>,
    registry: EndpointRegistry<E>,
    signer: CallbackSigner,
    config: CoordinatorConfig,
}

impl<E, B, S> std::fmt::Debug for StageCoordinator<E, B, S>
where
    E: EncodingEngine + ?Sized,
    B: BlobSource + ?Sized,
    S: CorrelationStore + ?Sized,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StageCoordinator")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<E, B, S> StageCoordinator<E, B, S>
where
    E: EncodingEngine + ?Sized,
    B: BlobSource + ?Sized,
    S: CorrelationStore + ?Sized,
{
    /// Build the stage, validating the signing key up front.
    pub fn new(
        config: CoordinatorConfig,
        engine: Arc<E>,
        blobs: Arc<B>,
        store: Arc<S>,
    ) -> CoordinatorResult<Self> {
        let signer = CallbackSigner::from_base64(&config.signing_key_base64)
            .map_err(|e| CoordinatorError::config_error(e.to_string()))?;
        let registry = EndpointRegistry::new(Arc::clone(&engine));

        Ok(Self {
            engine,
            blobs,
            store,
            registry,
            signer,
            config,
        })
    }

    /// Process one upload message end to end.
    ///
    /// Safe to redeliver: every step before blob deletion is idempotent or
    /// additive, and the state record write is an upsert. A failure after
    /// submission leaves the job running; only the correlation record is
    /// missing until a retry writes it.
    pub async fn handle(
        &self,
        state: &ProcessingState,
        blob: &SourceBlob,
    ) -> CoordinatorResult<SubmissionReceipt> {
        let logger = StageLogger::new(&state.id, "encode_submission");
        logger.log_start(&format!("Submitting encode for blob '{}'", blob.key));

        // Register the upload as an engine asset under its display title,
        // tagged with the correlation id for the engine-side join.
        let title = state.display_title().to_string();
        let ingest_url = self.blobs.ingest_url(blob, self.config.ingest_url_ttl).await?;
        let asset = self
            .engine
            .create_asset(&title, &ingest_url)
            .await
            .map_err(CoordinatorError::Registration)?;
        self.engine
            .update_asset_alternate_id(&asset.id, state.id.as_str())
            .await
            .map_err(CoordinatorError::Registration)?;
        logger.log_progress(&format!("Registered asset {} ('{}')", asset.id, title));

        // Endpoint before blob deletion: a misconfigured callback URL must
        // abort with the source intact and no job submitted.
        let endpoint = self
            .registry
            .get_or_create(&self.config.endpoint_name, &self.config.callback_url, &self.signer)
            .await
            .map_err(|e| match e {
                e @ (EngineError::InvalidEndpoint { .. } | EngineError::ConfigError(_)) => {
                    logger.log_error(&format!("Notification endpoint rejected: {}", e));
                    CoordinatorError::InvalidEndpoint(e.to_string())
                }
                e => CoordinatorError::EndpointProvisioning(e),
            })?;

        // The source is consumed here; from now on the media lives
        // engine-side only.
        self.blobs.delete(blob).await?;
        logger.log_progress(&format!("Deleted source blob '{}'", blob.key));

        // One job, one task, output named after the blob, unencrypted.
        let output_asset_name = state.blob_name.clone();
        let mut job = EncodeJob::new(format!("Encode {}", state.blob_name));
        job.add_task(EncodeTask::new(&self.config.encode_preset, self.config.job_priority))
            .add_input_asset(&asset)
            .add_output(&output_asset_name)
            .add_notification_subscription(&endpoint, TargetJobStates::FinalStatesOnly);

        let submitted = self.engine.submit_job(&job).await.map_err(|e| {
            logger.log_error(&format!(
                "Submission failed, asset {} left unreferenced: {}",
                asset.id, e
            ));
            CoordinatorError::Submission {
                asset_id: asset.id.clone(),
                source: e,
            }
        })?;
        logger.log_progress(&format!(
            "Engine accepted job {} in state '{}'",
            submitted.id, submitted.state
        ));

        // The record the webhook stage looks up by correlation id. Losing
        // this write strands the finished job, so it gets its own loud
        // failure path.
        if let Err(e) = self.store.upsert(state).await {
            logger.log_error(&format!(
                "State record not persisted after job {} was accepted; completion callback cannot be correlated until a retry writes it: {}",
                submitted.id, e
            ));
            return Err(CoordinatorError::StateStoreWrite(e));
        }

        logger.log_completion(&format!(
            "Job {} submitted, output asset '{}'",
            submitted.id, output_asset_name
        ));

        Ok(SubmissionReceipt {
            correlation_id: state.id.clone(),
            asset_id: asset.id,
            endpoint_id: endpoint.id,
            job_id: submitted.id,
            output_asset_name,
        })
    }
}
