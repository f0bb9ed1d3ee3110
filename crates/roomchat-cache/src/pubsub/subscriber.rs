//! Redis Pub/Sub subscriber.
//!
//! One background task owns the pub/sub connection and fans every message out
//! on a broadcast channel. [`RealtimeFeed::subscribe`] turns that fan-out into
//! a filtered stream per subscription.

use crate::pool::redact_url;
use crate::pubsub::PubSubChannel;
use async_trait::async_trait;
use futures::StreamExt;
use redis::Client;
use roomchat_core::error::DomainError;
use roomchat_core::events::{ChangeEvent, Subscription};
use roomchat_core::traits::{ChangeStream, RealtimeFeed, RepoResult};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, mpsc, oneshot, Mutex, RwLock};

/// Error type for subscriber operations
#[derive(Debug, thiserror::Error)]
pub enum SubscriberError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Channel closed")]
    ChannelClosed,

    #[error("Timed out waiting for Redis to acknowledge SUBSCRIBE")]
    AckTimeout,
}

impl From<SubscriberError> for DomainError {
    fn from(e: SubscriberError) -> Self {
        DomainError::RealtimeError(e.to_string())
    }
}

/// Result type for subscriber operations
pub type SubscriberResult<T> = Result<T, SubscriberError>;

/// Received message from Pub/Sub
#[derive(Debug, Clone)]
pub struct ReceivedMessage {
    /// Channel the message was received on
    pub channel: PubSubChannel,
    /// Decoded change event, if the payload was one
    pub event: Option<ChangeEvent>,
    /// Raw payload
    pub payload: String,
}

impl ReceivedMessage {
    /// Create from raw Redis message
    fn from_redis(channel_name: &str, payload: String) -> Self {
        let channel = PubSubChannel::parse(channel_name);
        let event = serde_json::from_str(&payload).ok();

        Self {
            channel,
            event,
            payload,
        }
    }
}

/// Pause between reconnection attempts
const RECONNECT_DELAY: Duration = Duration::from_millis(1000);

/// Subscriber configuration
#[derive(Debug, Clone)]
pub struct SubscriberConfig {
    /// Redis connection URL
    pub redis_url: String,
    /// Channel buffer size for broadcast
    pub broadcast_buffer: usize,
    /// How long `subscribe` waits for Redis to acknowledge a SUBSCRIBE
    pub ack_timeout: Duration,
}

impl Default for SubscriberConfig {
    fn default() -> Self {
        Self {
            redis_url: "redis://127.0.0.1:6379".to_string(),
            broadcast_buffer: 1024,
            ack_timeout: Duration::from_secs(5),
        }
    }
}

impl SubscriberConfig {
    pub fn from_app_config(config: &roomchat_common::AppConfig) -> Self {
        Self {
            redis_url: config.redis.url.clone(),
            broadcast_buffer: config.realtime.buffer,
            ..Self::default()
        }
    }
}

/// Redis Pub/Sub subscriber
pub struct Subscriber {
    /// Channels Redis has acknowledged; written only by the listener
    subscribed: Arc<RwLock<HashSet<String>>>,
    /// Held while a new channel is being subscribed
    subscribing: Mutex<()>,
    /// Broadcast sender for messages
    broadcast_tx: broadcast::Sender<ReceivedMessage>,
    /// Control channel for subscription management
    control_tx: mpsc::Sender<SubscriberCommand>,
    ack_timeout: Duration,
}

/// Commands for subscription management
#[derive(Debug)]
enum SubscriberCommand {
    /// Subscribe, then report the outcome once Redis has replied
    Subscribe {
        channels: Vec<String>,
        ack: oneshot::Sender<SubscriberResult<()>>,
    },
    Shutdown,
}

impl Subscriber {
    /// Create a new subscriber and start the background listener
    #[must_use]
    pub fn new(config: SubscriberConfig) -> Self {
        let (broadcast_tx, _) = broadcast::channel(config.broadcast_buffer);
        let (control_tx, control_rx) = mpsc::channel(32);
        let subscribed = Arc::new(RwLock::new(HashSet::new()));
        let ack_timeout = config.ack_timeout;

        tokio::spawn(Self::listener_loop(
            config,
            subscribed.clone(),
            broadcast_tx.clone(),
            control_rx,
        ));

        Self {
            subscribed,
            subscribing: Mutex::new(()),
            broadcast_tx,
            control_tx,
            ack_timeout,
        }
    }

    /// Background listener loop
    async fn listener_loop(
        config: SubscriberConfig,
        subscribed: Arc<RwLock<HashSet<String>>>,
        broadcast_tx: broadcast::Sender<ReceivedMessage>,
        mut control_rx: mpsc::Receiver<SubscriberCommand>,
    ) {
        loop {
            match Self::run_listener(&config, &subscribed, &broadcast_tx, &mut control_rx).await {
                Ok(true) => {
                    tracing::info!("Subscriber shutting down");
                    break;
                }
                Ok(false) => {}
                Err(e) => {
                    tracing::error!(error = %e, "Subscriber error, reconnecting...");
                    tokio::time::sleep(RECONNECT_DELAY).await;
                }
            }
        }
    }

    /// Run the listener until error or shutdown; `Ok(true)` means stop
    async fn run_listener(
        config: &SubscriberConfig,
        subscribed: &Arc<RwLock<HashSet<String>>>,
        broadcast_tx: &broadcast::Sender<ReceivedMessage>,
        control_rx: &mut mpsc::Receiver<SubscriberCommand>,
    ) -> SubscriberResult<bool> {
        let client = Client::open(config.redis_url.as_str())?;
        let mut pubsub = client.get_async_pubsub().await?;

        // Resubscribe after a reconnect
        {
            let channels = subscribed.read().await;
            for channel in channels.iter() {
                pubsub.subscribe(channel).await?;
            }
        }

        tracing::info!(url = %redact_url(&config.redis_url), "Subscriber connected to Redis");

        let mut stream = pubsub.on_message();

        loop {
            tokio::select! {
                msg = stream.next() => {
                    let Some(msg) = msg else {
                        tracing::warn!("Pub/Sub stream ended");
                        return Ok(false);
                    };
                    let channel_name = msg.get_channel_name().to_string();
                    let payload: String = msg.get_payload().unwrap_or_default();

                    // No receivers is fine
                    let _ = broadcast_tx.send(ReceivedMessage::from_redis(&channel_name, payload));

                    tracing::trace!(channel = %channel_name, "Received Pub/Sub message");
                }

                cmd = control_rx.recv() => {
                    match cmd {
                        Some(SubscriberCommand::Subscribe { channels, ack }) => {
                            // The message stream borrows the connection
                            drop(stream);
                            let mut outcome = Ok(());
                            for channel in &channels {
                                match pubsub.subscribe(channel).await {
                                    Ok(()) => {
                                        subscribed.write().await.insert(channel.clone());
                                        tracing::debug!(channel = %channel, "Subscribed to channel");
                                    }
                                    Err(e) => {
                                        tracing::error!(channel = %channel, error = %e, "Failed to subscribe");
                                        outcome = Err(SubscriberError::Redis(e));
                                        break;
                                    }
                                }
                            }
                            // The caller may have timed out already
                            let _ = ack.send(outcome);
                            stream = pubsub.on_message();
                        }
                        Some(SubscriberCommand::Shutdown) => return Ok(true),
                        None => {
                            tracing::warn!("Control channel closed");
                            return Ok(true);
                        }
                    }
                }
            }
        }
    }

    /// Subscribe to channels and wait until Redis has acknowledged them
    async fn subscribe_channels(&self, channels: &[PubSubChannel]) -> SubscriberResult<()> {
        let channels: Vec<String> = channels.iter().map(PubSubChannel::name).collect();
        let (ack, acked) = oneshot::channel();

        self.control_tx
            .send(SubscriberCommand::Subscribe { channels, ack })
            .await
            .map_err(|_| SubscriberError::ChannelClosed)?;

        match tokio::time::timeout(self.ack_timeout, acked).await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(_)) => Err(SubscriberError::ChannelClosed),
            Err(_) => Err(SubscriberError::AckTimeout),
        }
    }

    /// Get a receiver for broadcast messages
    #[must_use]
    pub fn receiver(&self) -> broadcast::Receiver<ReceivedMessage> {
        self.broadcast_tx.subscribe()
    }

    /// Shutdown the subscriber
    pub async fn shutdown(&self) -> SubscriberResult<()> {
        self.control_tx
            .send(SubscriberCommand::Shutdown)
            .await
            .map_err(|_| SubscriberError::ChannelClosed)
    }
}

/// Change events for one subscription out of the shared fan-out
pub(crate) fn filtered_changes(
    rx: broadcast::Receiver<ReceivedMessage>,
    subscription: Subscription,
) -> ChangeStream {
    let channel = PubSubChannel::table(subscription.table);

    futures::stream::unfold(rx, move |mut rx| {
        let channel = channel.clone();
        let subscription = subscription.clone();
        async move {
            loop {
                match rx.recv().await {
                    Ok(msg) if msg.channel == channel => match msg.event {
                        Some(event) if subscription.matches(&event) => return Some((event, rx)),
                        Some(_) => {}
                        None => tracing::debug!(channel = %channel, "Ignoring non-event payload"),
                    },
                    Ok(_) => {}
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, channel = %channel, "Realtime subscriber lagged");
                    }
                    Err(RecvError::Closed) => return None,
                }
            }
        }
    })
    .boxed()
}

#[async_trait]
impl RealtimeFeed for Subscriber {
    async fn subscribe(&self, subscription: Subscription) -> RepoResult<ChangeStream> {
        // Receiver first: every message published after the SUBSCRIBE is acknowledged reaches it
        let rx = self.receiver();
        let channel = PubSubChannel::table(subscription.table);
        let name = channel.name();

        if !self.subscribed.read().await.contains(&name) {
            let _guard = self.subscribing.lock().await;
            // Another caller may have finished subscribing while we waited
            if !self.subscribed.read().await.contains(&name) {
                self.subscribe_channels(&[channel]).await?;
            }
        }

        Ok(filtered_changes(rx, subscription))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use roomchat_core::events::{ChangeFilter, ChangeType, Table};
    use serde_json::json;

    fn message_event(chatroom_id: i64) -> ChangeEvent {
        ChangeEvent {
            table: Table::Messages,
            change_type: ChangeType::Insert,
            record: Some(json!({ "id": 1, "chatroom_id": chatroom_id })),
            old_record: None,
            commit_timestamp: Utc::now(),
        }
    }

    fn received(channel: &str, event: &ChangeEvent) -> ReceivedMessage {
        ReceivedMessage::from_redis(channel, serde_json::to_string(event).unwrap())
    }

    #[test]
    fn test_received_message_parsing() {
        let event = message_event(5);
        let msg = received("realtime:messages", &event);

        assert_eq!(msg.channel, PubSubChannel::Table(Table::Messages));
        assert_eq!(msg.event, Some(event));
    }

    #[test]
    fn test_received_message_invalid_json() {
        let msg = ReceivedMessage::from_redis("realtime:profiles", "invalid".to_string());

        assert_eq!(msg.channel, PubSubChannel::Table(Table::Profiles));
        assert!(msg.event.is_none());
        assert_eq!(msg.payload, "invalid");
    }

    #[tokio::test]
    async fn test_filtered_changes_skips_other_rows_and_channels() {
        let (tx, rx) = broadcast::channel(16);
        let subscription =
            Subscription::table(Table::Messages).filter(ChangeFilter::equals("chatroom_id", 7));
        let mut stream = filtered_changes(rx, subscription);

        tx.send(received("realtime:profiles", &message_event(7))).unwrap();
        tx.send(received("realtime:messages", &message_event(8))).unwrap();
        tx.send(ReceivedMessage::from_redis("realtime:messages", "noise".to_string()))
            .unwrap();
        tx.send(received("realtime:messages", &message_event(7))).unwrap();
        drop(tx);

        let first = stream.next().await.unwrap();
        assert_eq!(first.record.unwrap()["chatroom_id"], 7);
        assert!(stream.next().await.is_none());
    }

    #[test]
    fn test_subscriber_config_default() {
        let config = SubscriberConfig::default();
        assert_eq!(config.redis_url, "redis://127.0.0.1:6379");
        assert_eq!(config.broadcast_buffer, 1024);
        assert_eq!(config.ack_timeout, Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_subscribe_waits_for_redis_acknowledgement() {
        // Nothing listens on port 9, so the SUBSCRIBE is never acknowledged
        let subscriber = Subscriber::new(SubscriberConfig {
            redis_url: "redis://127.0.0.1:9".to_string(),
            ack_timeout: Duration::from_millis(200),
            ..SubscriberConfig::default()
        });

        let result = RealtimeFeed::subscribe(&subscriber, Subscription::table(Table::Messages)).await;
        assert!(matches!(result, Err(DomainError::RealtimeError(_))));
        assert!(subscriber.subscribed.read().await.is_empty());
    }
}
