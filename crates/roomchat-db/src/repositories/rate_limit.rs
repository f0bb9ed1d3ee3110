//! PostgreSQL implementation of RateLimitRepository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::{debug, instrument};

use roomchat_core::entities::{RateLimitAction, RateLimitDecision, RateLimitPolicy};
use roomchat_core::traits::{RateLimitRepository, RepoResult};
use roomchat_core::value_objects::Snowflake;

use crate::mappers::counter_from_model;
use crate::models::RateLimitModel;

use super::error::map_db_error;

/// PostgreSQL implementation of RateLimitRepository
#[derive(Clone)]
pub struct PgRateLimitRepository {
    pool: PgPool,
}

impl PgRateLimitRepository {
    /// Create a new PgRateLimitRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RateLimitRepository for PgRateLimitRepository {
    #[instrument(skip(self, policy))]
    async fn hit(
        &self,
        user_id: Snowflake,
        action: RateLimitAction,
        policy: &RateLimitPolicy,
        now: DateTime<Utc>,
    ) -> RepoResult<RateLimitDecision> {
        let mut tx = self.pool.begin().await.map_err(map_db_error)?;

        // A fresh row starts at zero so the register step below counts this call
        sqlx::query(
            r"
            INSERT INTO rate_limits (user_id, action, count, window_start)
            VALUES ($1, $2, 0, $3)
            ON CONFLICT (user_id, action) DO NOTHING
            ",
        )
        .bind(user_id.into_inner())
        .bind(action.as_str())
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(map_db_error)?;

        let model = sqlx::query_as::<_, RateLimitModel>(
            r"
            SELECT user_id, action, count, window_start
            FROM rate_limits
            WHERE user_id = $1 AND action = $2
            FOR UPDATE
            ",
        )
        .bind(user_id.into_inner())
        .bind(action.as_str())
        .fetch_one(&mut *tx)
        .await
        .map_err(map_db_error)?;

        let mut counter = counter_from_model(model, action);
        let decision = counter.register(policy, now);

        if decision.is_allowed() {
            sqlx::query(
                r"
                UPDATE rate_limits
                SET count = $3, window_start = $4
                WHERE user_id = $1 AND action = $2
                ",
            )
            .bind(user_id.into_inner())
            .bind(action.as_str())
            .bind(counter.count)
            .bind(counter.window_start)
            .execute(&mut *tx)
            .await
            .map_err(map_db_error)?;
        } else {
            debug!(%user_id, %action, "rate limited");
        }

        tx.commit().await.map_err(map_db_error)?;

        Ok(decision)
    }
}
