//! Source upload bucket client.
//!
//! This crate provides:
//! - The `BlobSource` seam the coordinator consumes (ingest URL, delete)
//! - An S3-compatible client implementation over that seam

pub mod client;
pub mod error;
pub mod source;

pub use client::{BucketClient, BucketConfig};
pub use error::{StorageError, StorageResult};
pub use source::{BlobSource, SourceBlob};
