//! PostgreSQL implementation of MessageRepository

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::instrument;

use roomchat_core::entities::{Message, NewMessage};
use roomchat_core::error::DomainError;
use roomchat_core::traits::{MessageQuery, MessageRepository, RepoResult};
use roomchat_core::value_objects::Snowflake;

use crate::models::MessageModel;

use super::error::map_db_error;

/// Upper bound on a single page request
pub const MAX_PAGE_SIZE: i64 = 100;

/// PostgreSQL implementation of MessageRepository
#[derive(Clone)]
pub struct PgMessageRepository {
    pool: PgPool,
}

impl PgMessageRepository {
    /// Create a new PgMessageRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MessageRepository for PgMessageRepository {
    #[instrument(skip(self))]
    async fn find_by_id(&self, id: Snowflake) -> RepoResult<Option<Message>> {
        let result = sqlx::query_as::<_, MessageModel>(
            r"
            SELECT id, chatroom_id, user_id, content, created_at, is_edited, is_deleted, bubble_color
            FROM messages
            WHERE id = $1
            ",
        )
        .bind(id.into_inner())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.map(Message::from))
    }

    #[instrument(skip(self))]
    async fn find_page(
        &self,
        chatroom_id: Snowflake,
        query: MessageQuery,
    ) -> RepoResult<Vec<Message>> {
        let limit = query.limit.clamp(1, MAX_PAGE_SIZE);

        // NULL bounds are open; both are exclusive
        let results = sqlx::query_as::<_, MessageModel>(
            r"
            SELECT id, chatroom_id, user_id, content, created_at, is_edited, is_deleted, bubble_color
            FROM messages
            WHERE chatroom_id = $1
              AND ($2::BIGINT IS NULL OR id < $2)
              AND ($3::BIGINT IS NULL OR id > $3)
            ORDER BY id DESC
            LIMIT $4
            ",
        )
        .bind(chatroom_id.into_inner())
        .bind(query.before.map(Snowflake::into_inner))
        .bind(query.after.map(Snowflake::into_inner))
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(results.into_iter().map(Message::from).collect())
    }

    #[instrument(skip(self, message), fields(chatroom_id = %message.chatroom_id, user_id = %message.user_id))]
    async fn create(&self, message: &NewMessage) -> RepoResult<Message> {
        let stored = sqlx::query_as::<_, MessageModel>(
            r"
            INSERT INTO messages (chatroom_id, user_id, content, bubble_color)
            VALUES ($1, $2, $3, $4)
            RETURNING id, chatroom_id, user_id, content, created_at, is_edited, is_deleted, bubble_color
            ",
        )
        .bind(message.chatroom_id.into_inner())
        .bind(message.user_id.into_inner())
        .bind(&message.content)
        .bind(&message.bubble_color)
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(Message::from(stored))
    }

    #[instrument(skip(self, message), fields(message_id = %message.id))]
    async fn update(&self, message: &Message) -> RepoResult<()> {
        let result = sqlx::query(
            r"
            UPDATE messages
            SET content = $2, is_edited = $3, bubble_color = $4
            WHERE id = $1 AND NOT is_deleted
            ",
        )
        .bind(message.id.into_inner())
        .bind(&message.content)
        .bind(message.is_edited)
        .bind(&message.bubble_color)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        if result.rows_affected() == 0 {
            return Err(DomainError::MessageNotFound(message.id));
        }

        Ok(())
    }

    #[instrument(skip(self))]
    async fn soft_delete(&self, id: Snowflake) -> RepoResult<bool> {
        let result = sqlx::query(
            r"
            UPDATE messages
            SET is_deleted = TRUE
            WHERE id = $1
            ",
        )
        .bind(id.into_inner())
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.rows_affected() > 0)
    }
}
