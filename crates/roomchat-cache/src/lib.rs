//! # roomchat-cache
//!
//! Redis transport for realtime change events.
//!
//! ## Features
//!
//! - **Connection Pool**: Managed Redis connection pool with deadpool
//! - **Pub/Sub**: Change events published per table channel
//! - **Relay**: Postgres `LISTEN` to Redis `PUBLISH` bridge
//!
//! ## Example
//!
//! ```ignore
//! use roomchat_cache::{Subscriber, SubscriberConfig};
//! use roomchat_core::events::{ChangeFilter, Subscription, Table};
//! use roomchat_core::traits::RealtimeFeed;
//!
//! let subscriber = Subscriber::new(SubscriberConfig::from_app_config(&config));
//! let mut changes = subscriber
//!     .subscribe(Subscription::table(Table::Messages).filter(ChangeFilter::equals("chatroom_id", room_id)))
//!     .await?;
//!
//! while let Some(event) = changes.next().await {
//!     // ...
//! }
//! ```

pub mod pool;
pub mod pubsub;
pub mod relay;

// Re-export pool types
pub use pool::{RedisPool, RedisPoolConfig, RedisPoolError, RedisResult};

// Re-export pubsub types
pub use pubsub::{
    PubSubChannel, Publisher, ReceivedMessage, Subscriber, SubscriberConfig, SubscriberError,
    SubscriberResult, REALTIME_CHANNEL_PREFIX,
};
