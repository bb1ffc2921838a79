//! In-memory backends. Contents are lost on restart.

use std::collections::HashMap;

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::{Mutex, RwLock};

use crate::blobs::{BlobStore, validate_blob_key};
use crate::errors::{StoreError, StoreResult};
use crate::records::{CustomerId, CustomerRecord, NewCustomer, RecordStore, RecordTable};

/// Records held in process memory.
#[derive(Default)]
pub struct InMemoryRecordStore {
    table: Mutex<RecordTable>,
}

impl InMemoryRecordStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn create(&self, customer: NewCustomer) -> StoreResult<CustomerRecord> {
        Ok(self.table.lock().insert(customer))
    }

    async fn list_by_key(&self, emp_no: &str) -> StoreResult<Vec<CustomerRecord>> {
        Ok(self.table.lock().list_by_key(emp_no))
    }

    async fn get(&self, id: CustomerId) -> StoreResult<Option<CustomerRecord>> {
        Ok(self.table.lock().get(id))
    }

    async fn attach_image(
        &self,
        id: CustomerId,
        image_file: String,
    ) -> StoreResult<CustomerRecord> {
        self.table.lock().attach_image(id, image_file)
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

/// Blobs held in process memory.
#[derive(Default)]
pub struct InMemoryBlobStore {
    blobs: RwLock<HashMap<String, Bytes>>,
}

impl InMemoryBlobStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored blobs.
    pub fn len(&self) -> usize {
        self.blobs.read().len()
    }

    /// Whether no blobs are stored.
    pub fn is_empty(&self) -> bool {
        self.blobs.read().is_empty()
    }
}

#[async_trait]
impl BlobStore for InMemoryBlobStore {
    async fn save(&self, key: &str, bytes: Bytes) -> StoreResult<String> {
        let key = validate_blob_key(key)?.to_owned();
        let _ = self.blobs.write().insert(key.clone(), bytes);
        Ok(key)
    }

    async fn retrieve(&self, id: &str) -> StoreResult<Bytes> {
        self.blobs
            .read()
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("blob {id}")))
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn customer(emp_no: &str) -> NewCustomer {
        NewCustomer {
            emp_no: emp_no.into(),
            name: "Kim".into(),
            phone: "010-0000-0000".into(),
            datetime: None,
        }
    }

    #[tokio::test]
    async fn create_then_list() {
        let store = InMemoryRecordStore::new();
        let created = store.create(customer("E1")).await.unwrap();
        let _ = store.create(customer("E2")).await.unwrap();

        let list = store.list_by_key("E1").await.unwrap();
        assert_eq!(list, vec![created]);
    }

    #[tokio::test]
    async fn attach_image_updates_record() {
        let store = InMemoryRecordStore::new();
        let created = store.create(customer("E1")).await.unwrap();
        let updated = store
            .attach_image(created.id, "Kim_0100000000.png".into())
            .await
            .unwrap();
        assert_eq!(updated.image_file.as_deref(), Some("Kim_0100000000.png"));
        let fetched = store.get(created.id).await.unwrap().unwrap();
        assert_eq!(fetched, updated);
    }

    #[tokio::test]
    async fn get_unknown_is_none() {
        let store = InMemoryRecordStore::new();
        assert!(store.get(42).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn blob_save_and_retrieve() {
        let store = InMemoryBlobStore::new();
        let id = store.save("a.png", Bytes::from_static(b"\x89PNG")).await.unwrap();
        assert_eq!(id, "a.png");
        assert_eq!(store.retrieve(&id).await.unwrap(), Bytes::from_static(b"\x89PNG"));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn blob_save_replaces() {
        let store = InMemoryBlobStore::new();
        let _ = store.save("a.png", Bytes::from_static(b"one")).await.unwrap();
        let _ = store.save("a.png", Bytes::from_static(b"two")).await.unwrap();
        assert_eq!(store.retrieve("a.png").await.unwrap(), Bytes::from_static(b"two"));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn blob_missing_is_not_found() {
        let store = InMemoryBlobStore::new();
        assert!(store.is_empty());
        assert!(matches!(
            store.retrieve("nope.png").await,
            Err(StoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn blob_bad_key_rejected() {
        let store = InMemoryBlobStore::new();
        let err = store.save("../x.png", Bytes::new()).await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidKey(_)));
    }
}
