//! Notification endpoint registry: idempotent lookup-or-create by name.

use std::sync::Arc;

use tracing::{debug, info, warn};
use url::Url;

use crate::api::EncodingEngine;
use crate::error::{EngineError, EngineResult};
use crate::signing::CallbackSigner;
use crate::types::NotificationEndpoint;

/// Idempotent get-or-create of a named callback subscription.
///
/// Lookup-then-create is not transactional against the engine: two
/// invocations that both observe "absent" may both attempt creation. The
/// loser re-lists and adopts the winner's endpoint instead of failing.
pub struct EndpointRegistry<E: EncodingEngine + ?Sized> {
    engine: Arc<E>,
}

impl<E: EncodingEngine + ?Sized> EndpointRegistry<E> {
    pub fn new(engine: Arc<E>) -> Self {
        Self { engine }
    }

    /// Return the endpoint with the given name, creating it if absent.
    ///
    /// An existing endpoint is returned unchanged; its URL is never
    /// re-validated. Creation failures that are not explained by a
    /// concurrent creator surface as `InvalidEndpoint` naming the offending
    /// callback URL.
    pub async fn get_or_create(
        &self,
        name: &str,
        callback_url: &str,
        signer: &CallbackSigner,
    ) -> EngineResult<NotificationEndpoint> {
        if let Some(existing) = self.find_by_name(name).await? {
            debug!(endpoint_id = %existing.id, name, "Reusing existing notification endpoint");
            return Ok(existing);
        }

        Self::validate_callback_url(callback_url)?;

        match self
            .engine
            .create_notification_endpoint(name, callback_url, &signer.credential_base64())
            .await
        {
            Ok(endpoint) => {
                info!(endpoint_id = %endpoint.id, name, "Provisioned notification endpoint");
                Ok(endpoint)
            }
            Err(create_err) => {
                // Another invocation may have won the create race between our
                // lookup and our create. Re-list before judging the failure.
                match self.find_by_name(name).await {
                    Ok(Some(existing)) => {
                        warn!(
                            endpoint_id = %existing.id,
                            name,
                            "Endpoint appeared concurrently, adopting it: {}",
                            create_err
                        );
                        Ok(existing)
                    }
                    _ => match create_err {
                        // Transient failures stay retryable for redelivery.
                        e @ (EngineError::Network(_) | EngineError::ServerError(_, _)) => Err(e),
                        e => Err(EngineError::invalid_endpoint(callback_url, e.to_string())),
                    },
                }
            }
        }
    }

    async fn find_by_name(&self, name: &str) -> EngineResult<Option<NotificationEndpoint>> {
        let endpoints = self.engine.list_notification_endpoints().await?;
        Ok(endpoints.into_iter().find(|e| e.name == name))
    }

    fn validate_callback_url(callback_url: &str) -> EngineResult<()> {
        let parsed = Url::parse(callback_url)
            .map_err(|e| EngineError::invalid_endpoint(callback_url, e.to_string()))?;

        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(EngineError::invalid_endpoint(
                callback_url,
                format!("unsupported scheme '{}'", parsed.scheme()),
            ));
        }

        Ok(())
    }
}
