//! Records persisted as a single JSON file.
//!
//! The whole table is rewritten after every mutation (write to a temp file,
//! then rename). Mutations apply to a copy of the table that replaces the
//! live one only after the write succeeds. There is no cross-process
//! locking: the last writer wins.

use std::path::PathBuf;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::errors::StoreResult;
use crate::records::{CustomerId, CustomerRecord, NewCustomer, RecordStore, RecordTable};

/// Record store backed by one JSON file.
pub struct JsonFileRecordStore {
    path: PathBuf,
    table: Mutex<RecordTable>,
}

impl JsonFileRecordStore {
    /// Open the store, loading existing records if the file exists.
    pub async fn open(path: impl Into<PathBuf>) -> StoreResult<Self> {
        let path = path.into();
        let table = match tokio::fs::read(&path).await {
            Ok(raw) => serde_json::from_slice::<RecordTable>(&raw)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => RecordTable::default(),
            Err(e) => return Err(e.into()),
        };
        info!(
            path = %path.display(),
            records = table.customers.len(),
            "record file opened"
        );
        Ok(Self {
            path,
            table: Mutex::new(table),
        })
    }

    async fn persist(&self, table: &RecordTable) -> StoreResult<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_vec_pretty(table)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        debug!(path = %self.path.display(), records = table.customers.len(), "record file written");
        Ok(())
    }
}

#[async_trait]
impl RecordStore for JsonFileRecordStore {
    async fn create(&self, customer: NewCustomer) -> StoreResult<CustomerRecord> {
        let mut table = self.table.lock().await;
        let mut next = table.clone();
        let record = next.insert(customer);
        self.persist(&next).await?;
        *table = next;
        Ok(record)
    }

    async fn list_by_key(&self, emp_no: &str) -> StoreResult<Vec<CustomerRecord>> {
        Ok(self.table.lock().await.list_by_key(emp_no))
    }

    async fn get(&self, id: CustomerId) -> StoreResult<Option<CustomerRecord>> {
        Ok(self.table.lock().await.get(id))
    }

    async fn attach_image(
        &self,
        id: CustomerId,
        image_file: String,
    ) -> StoreResult<CustomerRecord> {
        let mut table = self.table.lock().await;
        let mut next = table.clone();
        let record = next.attach_image(id, image_file)?;
        self.persist(&next).await?;
        *table = next;
        Ok(record)
    }

    fn backend_name(&self) -> &'static str {
        "json-file"
    }
}
