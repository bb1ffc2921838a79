//! Blobs stored as files in one directory.

use std::path::PathBuf;

use async_trait::async_trait;
use bytes::Bytes;
use tracing::debug;

use crate::blobs::{BlobStore, validate_blob_key};
use crate::errors::{StoreError, StoreResult};

/// One file per blob key under `dir`.
pub struct FsBlobStore {
    dir: PathBuf,
}

impl FsBlobStore {
    /// Create a store rooted at `dir`. The directory is created on first save.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn save(&self, key: &str, bytes: Bytes) -> StoreResult<String> {
        let key = validate_blob_key(key)?;
        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.dir.join(key);
        tokio::fs::write(&path, &bytes).await?;
        debug!(path = %path.display(), size = bytes.len(), "blob saved");
        Ok(key.to_owned())
    }

    async fn retrieve(&self, id: &str) -> StoreResult<Bytes> {
        let key = validate_blob_key(id)?;
        match tokio::fs::read(self.dir.join(key)).await {
            Ok(raw) => Ok(Bytes::from(raw)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StoreError::NotFound(format!("blob {id}")))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn backend_name(&self) -> &'static str {
        "fs"
    }
}
