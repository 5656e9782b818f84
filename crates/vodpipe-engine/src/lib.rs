//! Encoding engine client.
//!
//! This crate provides:
//! - The `EncodingEngine` seam the coordinator consumes
//! - A REST client implementation against the engine's HTTP API
//! - Local job/task builders (a job is assembled in memory and submitted once)
//! - The notification endpoint registry (idempotent get-or-create)
//! - HMAC signing of completion callbacks

pub mod api;
pub mod client;
pub mod endpoints;
pub mod error;
pub mod signing;
pub mod types;

#[cfg(test)]
mod client_tests;

pub use api::EncodingEngine;
pub use client::{EngineClient, EngineConfig};
pub use endpoints::EndpointRegistry;
pub use error::{EngineError, EngineResult};
pub use signing::{CallbackSigner, SIGNING_KEY_LEN};
pub use types::{
    Asset, EncodeJob, EncodeTask, NotificationEndpoint, NotificationSubscription, SubmittedJob,
    TargetJobStates, TaskOutput, DEFAULT_JOB_PRIORITY,
};
