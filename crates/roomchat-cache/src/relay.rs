//! Change relay.
//!
//! Forwards row change notifications from Postgres onto Redis so that any
//! number of [`Subscriber`](crate::Subscriber)s can fan them out to clients.

use std::sync::Arc;

use roomchat_common::{AppConfig, AppError};
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::pool::RedisPool;
use crate::pubsub::Publisher;

/// Run the relay until `shutdown` is cancelled
pub async fn run(config: AppConfig, shutdown: CancellationToken) -> Result<(), AppError> {
    let pool = roomchat_db::create_pool(&config.database)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

    let redis = RedisPool::from_config(&config.redis).map_err(|e| AppError::Cache(e.to_string()))?;
    redis
        .health_check()
        .await
        .map_err(|e| AppError::Cache(e.to_string()))?;

    let listener = roomchat_db::ChangeListener::new(
        pool,
        config.realtime.notify_channel.clone(),
        Arc::new(Publisher::new(redis)),
    );

    info!(channel = %config.realtime.notify_channel, "Change relay started");
    listener.run(shutdown).await;
    info!("Change relay stopped");

    Ok(())
}
