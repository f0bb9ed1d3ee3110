//! Wire a [`ServiceContext`] to the configured backend

use std::sync::Arc;

use chrono::Duration;
use roomchat_cache::{Subscriber, SubscriberConfig};
use roomchat_common::{AppConfig, AppError, JwtService};
use roomchat_core::RateLimitPolicy;
use roomchat_db::{
    create_pool, LocalObjectStorage, PgAuthProvider, PgChatroomRepository,
    PgDirectMessageRepository, PgMembershipRepository, PgMessageRepository, PgProfileRepository,
    PgRateLimitRepository,
};
use tracing::info;

use crate::http::{ImageSearchClient, PushClient};
use crate::services::ServiceContext;

/// Send quota from configuration
pub fn send_policy(config: &AppConfig) -> RateLimitPolicy {
    RateLimitPolicy::new(
        config.rate_limit.messages_per_window,
        Duration::seconds(config.rate_limit.window_seconds),
    )
}

/// Connect to Postgres and Redis and build a context
///
/// Must be called inside a tokio runtime; the realtime subscriber spawns
/// its listener task immediately.
pub async fn connect(config: &AppConfig) -> Result<ServiceContext, AppError> {
    let pool = create_pool(&config.database)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

    let jwt = JwtService::new(
        &config.jwt.secret,
        config.jwt.access_token_expiry,
        config.jwt.refresh_token_expiry,
    );

    let push = PushClient::from_config(&config.push).map_err(AppError::internal)?;
    let images = ImageSearchClient::from_config(&config.images).map_err(AppError::internal)?;
    let subscriber = Subscriber::new(SubscriberConfig::from_app_config(config));

    let ctx = ServiceContext::builder()
        .profiles(Arc::new(PgProfileRepository::new(pool.clone())))
        .chatrooms(Arc::new(PgChatroomRepository::new(pool.clone())))
        .memberships(Arc::new(PgMembershipRepository::new(pool.clone())))
        .messages(Arc::new(PgMessageRepository::new(pool.clone())))
        .direct_messages(Arc::new(PgDirectMessageRepository::new(pool.clone())))
        .rate_limits(Arc::new(PgRateLimitRepository::new(pool.clone())))
        .auth(Arc::new(PgAuthProvider::new(pool, jwt)))
        .storage(Arc::new(LocalObjectStorage::from_config(&config.storage)))
        .realtime(Arc::new(subscriber))
        .push(push)
        .images(images)
        .send_policy(send_policy(config))
        .build()
        .map_err(AppError::from)?;

    info!(env = ?config.app.env, "Client context connected");
    Ok(ctx)
}
