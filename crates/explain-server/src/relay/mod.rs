//! Real-time relay: channel registry, broadcaster, subscription lifecycle,
//! keep-alive, and the stream frame codec.

pub mod broadcast;
pub mod connection;
pub mod frame;
pub mod keepalive;
pub mod lifecycle;
pub mod registry;

pub use broadcast::{EventBroadcaster, PublishOutcome};
pub use connection::SubscriberConnection;
pub use frame::Frame;
pub use lifecycle::{SubscriptionManager, SubscriptionStream};
pub use registry::ChannelRegistry;
