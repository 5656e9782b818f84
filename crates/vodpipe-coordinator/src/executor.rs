//! Upload message executor.
//!
//! Drives the submission stage from the Redis Streams consumer group:
//! concurrent message processing under a semaphore, periodic claiming of
//! messages orphaned by crashed coordinators, retry counting, and a dead
//! letter queue for messages that cannot succeed.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use vodpipe_engine::EncodingEngine;
use vodpipe_queue::{UploadMessage, UploadQueue};
use vodpipe_state::CorrelationStore;
use vodpipe_storage::{BlobSource, SourceBlob};

use crate::config::CoordinatorConfig;
use crate::coordinator::StageCoordinator;
use crate::error::CoordinatorResult;

/// The coordinator over dynamic seams, as the executor drives it.
pub type DynCoordinator =
    StageCoordinator<dyn EncodingEngine, dyn BlobSource, dyn CorrelationStore>;

/// Executor that processes upload messages from the queue.
pub struct MessageExecutor {
    config: CoordinatorConfig,
    coordinator: Arc<DynCoordinator>,
    queue: Arc<UploadQueue>,
    message_semaphore: Arc<Semaphore>,
    shutdown: tokio::sync::watch::Sender<bool>,
    consumer_name: String,
}

impl MessageExecutor {
    /// Create a new message executor.
    pub fn new(
        config: CoordinatorConfig,
        coordinator: Arc<DynCoordinator>,
        queue: UploadQueue,
    ) -> Self {
        let message_semaphore = Arc::new(Semaphore::new(config.max_concurrent_messages));
        let (shutdown, _) = tokio::sync::watch::channel(false);
        let consumer_name = format!("coordinator-{}", Uuid::new_v4());

        Self {
            config,
            coordinator,
            queue: Arc::new(queue),
            message_semaphore,
            shutdown,
            consumer_name,
        }
    }

    /// Start the executor.
    pub async fn run(&self) -> CoordinatorResult<()> {
        info!(
            "Starting message executor '{}' with {} max concurrent messages",
            self.consumer_name, self.config.max_concurrent_messages
        );

        self.queue.init().await?;

        let mut shutdown_rx = self.shutdown.subscribe();

        // Periodically claim messages stuck pending on dead consumers.
        let queue_clone = Arc::clone(&self.queue);
        let coordinator_clone = Arc::clone(&self.coordinator);
        let consumer_name = self.consumer_name.clone();
        let semaphore_clone = Arc::clone(&self.message_semaphore);
        let claim_interval = self.config.claim_interval;
        let claim_min_idle_ms = self.config.claim_min_idle.as_millis() as u64;
        let mut shutdown_rx_claim = self.shutdown.subscribe();

        let claim_task = tokio::spawn(async move {
            let mut interval = tokio::time::interval(claim_interval);
            loop {
                tokio::select! {
                    _ = shutdown_rx_claim.changed() => {
                        if *shutdown_rx_claim.borrow() {
                            break;
                        }
                    }
                    _ = interval.tick() => {
                        match queue_clone.claim_pending(&consumer_name, claim_min_idle_ms, 5).await {
                            Ok(messages) if !messages.is_empty() => {
                                info!("Claimed {} pending messages", messages.len());
                                for (message_id, message) in messages {
                                    let coordinator = Arc::clone(&coordinator_clone);
                                    let queue = Arc::clone(&queue_clone);
                                    let permit = semaphore_clone.clone().acquire_owned().await;
                                    let Ok(permit) = permit else {
                                        break;
                                    };

                                    tokio::spawn(async move {
                                        let _permit = permit;
                                        Self::execute_message(coordinator, queue, message_id, message).await;
                                    });
                                }
                            }
                            Ok(_) => {}
                            Err(e) => {
                                warn!("Failed to claim pending messages: {}", e);
                            }
                        }
                    }
                }
            }
        });

        // Main consumption loop
        loop {
            tokio::select! {
                _ = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        info!("Shutdown signal received, stopping executor");
                        break;
                    }
                }
                result = self.consume_messages() => {
                    if let Err(e) = result {
                        error!("Error consuming messages: {}", e);
                        // Back off on error
                        tokio::time::sleep(Duration::from_secs(5)).await;
                    }
                }
            }
        }

        claim_task.abort();

        info!("Waiting for in-flight messages to complete...");
        let _ = tokio::time::timeout(self.config.shutdown_timeout, self.wait_for_messages()).await;

        info!("Message executor stopped");
        Ok(())
    }

    /// Consume and process messages from the queue.
    async fn consume_messages(&self) -> CoordinatorResult<()> {
        let available = self.message_semaphore.available_permits();
        if available == 0 {
            // All slots busy, wait a bit
            tokio::time::sleep(Duration::from_millis(100)).await;
            return Ok(());
        }

        let messages = self
            .queue
            .consume(
                &self.consumer_name,
                1000, // Block for 1 second
                available.min(5),
            )
            .await?;

        if messages.is_empty() {
            return Ok(());
        }

        debug!("Consumed {} messages from queue", messages.len());

        for (message_id, message) in messages {
            let coordinator = Arc::clone(&self.coordinator);
            let queue = Arc::clone(&self.queue);
            let permit = self
                .message_semaphore
                .clone()
                .acquire_owned()
                .await
                .map_err(|_| crate::error::CoordinatorError::config_error("Semaphore closed"))?;

            tokio::spawn(async move {
                let _permit = permit;
                Self::execute_message(coordinator, queue, message_id, message).await;
            });
        }

        Ok(())
    }

    /// Execute a single message with retry and DLQ handling.
    async fn execute_message(
        coordinator: Arc<DynCoordinator>,
        queue: Arc<UploadQueue>,
        message_id: String,
        message: UploadMessage,
    ) {
        let correlation_id = message.state.id.to_string();
        info!("Processing upload message {}", correlation_id);

        let blob = SourceBlob::new(&message.blob_key);
        let result = coordinator.handle(&message.state, &blob).await;

        match result {
            Ok(receipt) => {
                info!(
                    "Upload {} submitted as job {}",
                    correlation_id, receipt.job_id
                );
                if let Err(e) = queue.ack(&message_id).await {
                    error!("Failed to ack message {}: {}", correlation_id, e);
                }
            }
            Err(e) if !e.is_retryable() => {
                // Redelivery cannot fix this; park it for an operator.
                error!(
                    "Message {} failed permanently, moving to DLQ: {}",
                    correlation_id, e
                );
                if let Err(dlq_err) = queue.dlq(&message_id, &message, &e.to_string()).await {
                    error!("Failed to move message {} to DLQ: {}", correlation_id, dlq_err);
                }
                if let Err(e) = queue.clear_dedup(&message).await {
                    warn!("Failed to clear dedup key for {}: {}", correlation_id, e);
                }
            }
            Err(e) => {
                error!("Message {} failed: {}", correlation_id, e);

                let retry_count = queue.increment_retry(&message_id).await.unwrap_or(999);
                let max_retries = queue.max_retries();

                if retry_count >= max_retries {
                    warn!(
                        "Message {} exceeded max retries ({}), moving to DLQ",
                        correlation_id, max_retries
                    );
                    if let Err(dlq_err) = queue.dlq(&message_id, &message, &e.to_string()).await {
                        error!("Failed to move message {} to DLQ: {}", correlation_id, dlq_err);
                    }
                    if let Err(e) = queue.clear_dedup(&message).await {
                        warn!("Failed to clear dedup key for {}: {}", correlation_id, e);
                    }
                } else {
                    info!(
                        "Message {} will be redelivered (attempt {}/{})",
                        correlation_id, retry_count, max_retries
                    );
                }
            }
        }
    }

    /// Wait for all in-flight messages to complete.
    async fn wait_for_messages(&self) {
        loop {
            let available = self.message_semaphore.available_permits();
            if available == self.config.max_concurrent_messages {
                break;
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
    }

    /// Signal shutdown.
    pub fn shutdown(&self) {
        let _ = self.shutdown.send(true);
    }
}
