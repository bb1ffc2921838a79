//! # explain-server
//!
//! Axum HTTP server for the Explain relay.
//!
//! - Relay core: per-key channel registry, fan-out broadcaster, subscription
//!   lifecycle with keep-alive frames (`relay`)
//! - `GET /subscribe/{key}` opens a `text/event-stream`; `POST /api/send`
//!   publishes `{key, type, data}` to every stream open under `key`
//! - Customer records and image uploads backed by `explain-store`, with
//!   uploads announced on the customer's channel
//! - Health, Prometheus metrics, and graceful shutdown via `CancellationToken`

#![deny(unsafe_code)]

pub mod api;
pub mod config;
pub mod health;
pub mod metrics;
pub mod relay;
pub mod server;
pub mod shutdown;
