//! # explain-store
//!
//! Storage collaborators used by the customer feature layer. The relay core
//! never touches these; they sit behind two traits:
//!
//! - [`RecordStore`]: create and list customer records per subscriber key
//! - [`BlobStore`]: save and fetch uploaded images by key
//!
//! Backends: [`InMemoryRecordStore`] / [`JsonFileRecordStore`] and
//! [`InMemoryBlobStore`] / [`FsBlobStore`].

#![deny(unsafe_code)]

pub mod blobs;
pub mod errors;
pub mod fs_blob;
pub mod json_file;
pub mod memory;
pub mod records;

pub use blobs::{BlobStore, validate_blob_key};
pub use errors::{StoreError, StoreResult};
pub use fs_blob::FsBlobStore;
pub use json_file::JsonFileRecordStore;
pub use memory::{InMemoryBlobStore, InMemoryRecordStore};
pub use records::{CustomerId, CustomerRecord, NewCustomer, RecordStore};
