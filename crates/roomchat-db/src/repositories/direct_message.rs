//! PostgreSQL implementation of DirectMessageRepository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::instrument;

use roomchat_core::entities::{
    ConversationId, ConversationSummary, DirectMessage, NewDirectMessage,
};
use roomchat_core::traits::{DirectMessageRepository, MessageQuery, RepoResult};
use roomchat_core::value_objects::Snowflake;

use crate::mappers::summary_from_model;
use crate::models::{ConversationSummaryModel, DirectMessageModel};

use super::error::map_db_error;
use super::message::MAX_PAGE_SIZE;

/// PostgreSQL implementation of DirectMessageRepository
#[derive(Clone)]
pub struct PgDirectMessageRepository {
    pool: PgPool,
}

impl PgDirectMessageRepository {
    /// Create a new PgDirectMessageRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DirectMessageRepository for PgDirectMessageRepository {
    #[instrument(skip(self))]
    async fn find_by_id(&self, id: Snowflake) -> RepoResult<Option<DirectMessage>> {
        let result = sqlx::query_as::<_, DirectMessageModel>(
            r"
            SELECT id, sender_id, receiver_id, conversation_id, content, created_at, read_at
            FROM direct_messages
            WHERE id = $1
            ",
        )
        .bind(id.into_inner())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.map(DirectMessage::from))
    }

    #[instrument(skip(self))]
    async fn find_conversation_page(
        &self,
        conversation_id: &ConversationId,
        query: MessageQuery,
    ) -> RepoResult<Vec<DirectMessage>> {
        let results = sqlx::query_as::<_, DirectMessageModel>(
            r"
            SELECT id, sender_id, receiver_id, conversation_id, content, created_at, read_at
            FROM direct_messages
            WHERE conversation_id = $1
              AND ($2::BIGINT IS NULL OR id < $2)
              AND ($3::BIGINT IS NULL OR id > $3)
            ORDER BY id DESC
            LIMIT $4
            ",
        )
        .bind(conversation_id.as_str())
        .bind(query.before.map(Snowflake::into_inner))
        .bind(query.after.map(Snowflake::into_inner))
        .bind(query.limit.clamp(1, MAX_PAGE_SIZE))
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(results.into_iter().map(DirectMessage::from).collect())
    }

    #[instrument(skip(self, message), fields(sender_id = %message.sender_id, receiver_id = %message.receiver_id))]
    async fn create(&self, message: &NewDirectMessage) -> RepoResult<DirectMessage> {
        let stored = sqlx::query_as::<_, DirectMessageModel>(
            r"
            INSERT INTO direct_messages (sender_id, receiver_id, conversation_id, content)
            VALUES ($1, $2, $3, $4)
            RETURNING id, sender_id, receiver_id, conversation_id, content, created_at, read_at
            ",
        )
        .bind(message.sender_id.into_inner())
        .bind(message.receiver_id.into_inner())
        .bind(message.conversation_id().as_str())
        .bind(&message.content)
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(DirectMessage::from(stored))
    }

    #[instrument(skip(self))]
    async fn mark_conversation_read(
        &self,
        conversation_id: &ConversationId,
        reader_id: Snowflake,
        at: DateTime<Utc>,
    ) -> RepoResult<u64> {
        let result = sqlx::query(
            r"
            UPDATE direct_messages
            SET read_at = $3
            WHERE conversation_id = $1 AND receiver_id = $2 AND read_at IS NULL
            ",
        )
        .bind(conversation_id.as_str())
        .bind(reader_id.into_inner())
        .bind(at)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.rows_affected())
    }

    #[instrument(skip(self))]
    async fn unread_count(&self, user_id: Snowflake) -> RepoResult<i64> {
        sqlx::query_scalar::<_, i64>(
            r"
            SELECT COUNT(*) FROM direct_messages WHERE receiver_id = $1 AND read_at IS NULL
            ",
        )
        .bind(user_id.into_inner())
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_error)
    }

    #[instrument(skip(self))]
    async fn conversation_summaries(&self, user_id: Snowflake) -> RepoResult<Vec<ConversationSummary>> {
        let results = sqlx::query_as::<_, ConversationSummaryModel>(
            r"
            WITH mine AS (
                SELECT * FROM direct_messages WHERE sender_id = $1 OR receiver_id = $1
            ),
            latest AS (
                SELECT DISTINCT ON (conversation_id) *
                FROM mine
                ORDER BY conversation_id, id DESC
            )
            SELECT l.id, l.sender_id, l.receiver_id, l.conversation_id, l.content, l.created_at,
                   l.read_at,
                   (SELECT COUNT(*) FROM mine u
                    WHERE u.conversation_id = l.conversation_id
                      AND u.receiver_id = $1 AND u.read_at IS NULL) AS unread_count
            FROM latest l
            ORDER BY l.id DESC
            ",
        )
        .bind(user_id.into_inner())
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(results
            .into_iter()
            .map(|model| summary_from_model(model, user_id))
            .collect())
    }
}
