//! Redis Pub/Sub module.
//!
//! Carries change events between the relay and realtime subscribers.

mod channels;
mod publisher;
mod subscriber;

pub use channels::{PubSubChannel, REALTIME_CHANNEL_PREFIX};
pub use publisher::Publisher;
pub use subscriber::{
    ReceivedMessage, Subscriber, SubscriberConfig, SubscriberError, SubscriberResult,
};
