//! Encode submission coordinator binary.

use std::sync::Arc;

use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use vodpipe_coordinator::{CoordinatorConfig, DynCoordinator, MessageExecutor, StageCoordinator};
use vodpipe_engine::{EncodingEngine, EngineClient};
use vodpipe_queue::UploadQueue;
use vodpipe_state::{CorrelationStore, StateStoreClient};
use vodpipe_storage::{BlobSource, BucketClient};

#[tokio::main]
async fn main() {
    // Install rustls crypto provider (required for TLS/HTTPS)
    rustls::crypto::ring::default_provider()
        .install_default()
        .expect("Failed to install rustls crypto provider");

    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing with colored output for dev, JSON for production
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::from_default_env()
        .add_directive("vodpipe=info".parse().unwrap())
        .add_directive("hyper=warn".parse().unwrap());

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }

    info!("Starting vodpipe-coordinator");

    let config = match CoordinatorConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            error!("Failed to load coordinator config: {}", e);
            std::process::exit(1);
        }
    };
    info!(
        "Coordinator config: endpoint '{}', preset '{}', priority {}",
        config.endpoint_name, config.encode_preset, config.job_priority
    );

    let engine: Arc<dyn EncodingEngine> = match EngineClient::from_env() {
        Ok(c) => Arc::new(c),
        Err(e) => {
            error!("Failed to create engine client: {}", e);
            std::process::exit(1);
        }
    };

    let blobs: Arc<dyn BlobSource> = match BucketClient::from_env().await {
        Ok(c) => Arc::new(c),
        Err(e) => {
            error!("Failed to create bucket client: {}", e);
            std::process::exit(1);
        }
    };

    let store: Arc<dyn CorrelationStore> = match StateStoreClient::from_env().await {
        Ok(c) => Arc::new(c),
        Err(e) => {
            error!("Failed to create state store client: {}", e);
            std::process::exit(1);
        }
    };

    let queue = match UploadQueue::from_env() {
        Ok(q) => q,
        Err(e) => {
            error!("Failed to create upload queue: {}", e);
            std::process::exit(1);
        }
    };

    let coordinator: Arc<DynCoordinator> =
        match StageCoordinator::new(config.clone(), engine, blobs, store) {
            Ok(c) => Arc::new(c),
            Err(e) => {
                error!("Failed to create coordinator: {}", e);
                std::process::exit(1);
            }
        };

    let executor = Arc::new(MessageExecutor::new(config, coordinator, queue));

    // Setup signal handler
    let executor_shutdown = Arc::clone(&executor);
    let shutdown_handle = tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("Received shutdown signal");
        executor_shutdown.shutdown();
    });

    if let Err(e) = executor.run().await {
        error!("Executor error: {}", e);
        std::process::exit(1);
    }

    shutdown_handle.abort();

    info!("Coordinator shutdown complete");
}
