//! The [`BlobStore`] trait and blob key rules.

use async_trait::async_trait;
use bytes::Bytes;

use crate::errors::{StoreError, StoreResult};

/// Binary object storage for uploaded images.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store `bytes` under `key`, replacing any previous blob. Returns the
    /// identifier to pass to [`BlobStore::retrieve`].
    async fn save(&self, key: &str, bytes: Bytes) -> StoreResult<String>;
    /// Fetch a blob by identifier.
    async fn retrieve(&self, id: &str) -> StoreResult<Bytes>;
    /// Short backend name for logs.
    fn backend_name(&self) -> &'static str;
}

/// Check that a blob key is a single, plain file name.
///
/// Keys are used verbatim as file names by [`crate::FsBlobStore`], so path
/// separators, parent references and hidden names are refused.
pub fn validate_blob_key(key: &str) -> StoreResult<&str> {
    let invalid = key.is_empty()
        || key.starts_with('.')
        || key.contains(['/', '\\', '\0'])
        || key.contains("..");
    if invalid {
        return Err(StoreError::InvalidKey(key.to_owned()));
    }
    Ok(key)
}
