//! Source blob handle and the seam the coordinator consumes.

use async_trait::async_trait;
use std::time::Duration;

use crate::error::StorageResult;

/// Handle to one uploaded source file in the bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceBlob {
    /// Object key within the upload bucket.
    pub key: String,
}

impl SourceBlob {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }

    /// File name portion of the key (everything after the last `/`).
    pub fn file_name(&self) -> &str {
        self.key.rsplit('/').next().unwrap_or(&self.key)
    }
}

/// Blob source operations the submission stage needs.
///
/// The upload bucket itself is an external collaborator; the coordinator only
/// needs a readable URL the engine can ingest from, deletion, and an
/// existence check for verification.
#[async_trait]
pub trait BlobSource: Send + Sync {
    /// Short-lived URL the encoding engine can read the blob from.
    async fn ingest_url(&self, blob: &SourceBlob, expires_in: Duration) -> StorageResult<String>;

    /// Irrevocably remove the source blob from its upload location.
    async fn delete(&self, blob: &SourceBlob) -> StorageResult<()>;

    /// Check whether the blob still exists.
    async fn exists(&self, blob: &SourceBlob) -> StorageResult<bool>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_name_strips_prefix() {
        let blob = SourceBlob::new("uploads/2026/clip.mp4");
        assert_eq!(blob.file_name(), "clip.mp4");
    }

    #[test]
    fn file_name_of_bare_key() {
        let blob = SourceBlob::new("clip.mp4");
        assert_eq!(blob.file_name(), "clip.mp4");
    }
}
