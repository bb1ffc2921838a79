//! # explain-core
//!
//! Shared vocabulary for the Explain relay crates.
//!
//! - **Keys and IDs**: [`SubscriberKey`] (validated channel partition key) and
//!   [`ConnectionId`] (UUID v7 per subscriber connection)
//! - **Payloads**: [`RelayEvent`], the opaque `{type, data}` envelope pushed to
//!   subscribers
//! - **Errors**: [`ErrorCode`] machine-readable codes and [`ValidationError`]
//! - **Logging**: [`logging::init_subscriber`] for the `tracing` stack

#![deny(unsafe_code)]

pub mod errors;
pub mod events;
pub mod ids;
pub mod logging;

pub use errors::{ErrorCode, ValidationError};
pub use events::RelayEvent;
pub use ids::{ConnectionId, SubscriberKey};
