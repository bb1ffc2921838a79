//! Customer records and the [`RecordStore`] trait.

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{StoreError, StoreResult};

/// Numeric customer ID, assigned sequentially from 1.
pub type CustomerId = u64;

/// A stored customer contact record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerRecord {
    /// Assigned ID.
    pub id: CustomerId,
    /// Subscriber key (agent number) the customer belongs to.
    pub emp_no: String,
    /// Customer name.
    pub name: String,
    /// Customer phone number as entered.
    pub phone: String,
    /// Consultation time (RFC 3339).
    pub datetime: String,
    /// File name of the attached image, once uploaded.
    pub image_file: Option<String>,
}

/// Input for [`RecordStore::create`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewCustomer {
    /// Subscriber key.
    pub emp_no: String,
    /// Customer name.
    pub name: String,
    /// Customer phone number.
    pub phone: String,
    /// Consultation time; defaults to now.
    pub datetime: Option<String>,
}

/// Record persistence used by the customer endpoints.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Store a new record and return it with its assigned ID.
    async fn create(&self, customer: NewCustomer) -> StoreResult<CustomerRecord>;
    /// All records for a subscriber key, in creation order.
    async fn list_by_key(&self, emp_no: &str) -> StoreResult<Vec<CustomerRecord>>;
    /// Fetch one record.
    async fn get(&self, id: CustomerId) -> StoreResult<Option<CustomerRecord>>;
    /// Record the image file name on an existing customer.
    async fn attach_image(&self, id: CustomerId, image_file: String)
    -> StoreResult<CustomerRecord>;
    /// Short backend name for logs and health output.
    fn backend_name(&self) -> &'static str;
}

/// Record table shared by the in-memory and JSON-file backends.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RecordTable {
    pub(crate) next_id: CustomerId,
    pub(crate) customers: Vec<CustomerRecord>,
}

impl Default for RecordTable {
    fn default() -> Self {
        Self {
            next_id: 1,
            customers: Vec::new(),
        }
    }
}

impl RecordTable {
    pub(crate) fn insert(&mut self, customer: NewCustomer) -> CustomerRecord {
        let record = CustomerRecord {
            id: self.next_id,
            emp_no: customer.emp_no,
            name: customer.name,
            phone: customer.phone,
            datetime: customer
                .datetime
                .filter(|d| !d.trim().is_empty())
                .unwrap_or_else(now_rfc3339),
            image_file: None,
        };
        self.next_id += 1;
        self.customers.push(record.clone());
        record
    }

    pub(crate) fn list_by_key(&self, emp_no: &str) -> Vec<CustomerRecord> {
        self.customers
            .iter()
            .filter(|c| c.emp_no == emp_no)
            .cloned()
            .collect()
    }

    pub(crate) fn get(&self, id: CustomerId) -> Option<CustomerRecord> {
        self.customers.iter().find(|c| c.id == id).cloned()
    }

    pub(crate) fn attach_image(
        &mut self,
        id: CustomerId,
        image_file: String,
    ) -> StoreResult<CustomerRecord> {
        let record = self
            .customers
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| StoreError::NotFound(format!("customer {id}")))?;
        record.image_file = Some(image_file);
        Ok(record.clone())
    }
}

fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}
