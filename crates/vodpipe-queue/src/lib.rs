//! Upload message queue over Redis Streams.
//!
//! This crate provides:
//! - The `UploadMessage` delivered once per upload event
//! - Consumer-group consumption with at-least-once redelivery
//! - Retry counting and a dead letter queue

pub mod error;
pub mod message;
pub mod queue;

pub use error::{QueueError, QueueResult};
pub use message::UploadMessage;
pub use queue::{QueueConfig, UploadQueue};
