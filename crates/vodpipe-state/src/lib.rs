//! Correlation state store over the Firestore REST API.
//!
//! This crate provides:
//! - The `CorrelationStore` seam the coordinator consumes (upsert/get)
//! - A Firestore-backed implementation with token caching and retry

pub mod client;
pub mod error;
pub mod metrics;
pub mod retry;
pub mod store;
pub mod token_cache;
pub mod types;

pub use client::{StateStoreClient, StateStoreConfig};
pub use error::{StateStoreError, StateStoreResult};
pub use retry::RetryConfig;
pub use store::CorrelationStore;
