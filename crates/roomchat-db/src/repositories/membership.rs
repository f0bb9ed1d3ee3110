//! PostgreSQL implementation of MembershipRepository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::{debug, instrument};

use roomchat_core::entities::{Chatroom, ChatroomMembership, JoinOutcome};
use roomchat_core::error::DomainError;
use roomchat_core::traits::{MembershipRepository, RepoResult};
use roomchat_core::value_objects::Snowflake;

use crate::models::{ChatroomModel, MembershipModel};

use super::error::map_db_error;

/// PostgreSQL implementation of MembershipRepository
#[derive(Clone)]
pub struct PgMembershipRepository {
    pool: PgPool,
}

impl PgMembershipRepository {
    /// Create a new PgMembershipRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn find(&self, chatroom_id: i64, user_id: i64) -> RepoResult<Option<MembershipModel>> {
        sqlx::query_as::<_, MembershipModel>(
            r"
            SELECT chatroom_id, user_id, joined_at
            FROM chatroom_members
            WHERE chatroom_id = $1 AND user_id = $2
            ",
        )
        .bind(chatroom_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)
    }

    /// Why the guarded insert added nothing
    async fn rejection_reason(&self, chatroom_id: Snowflake) -> RepoResult<DomainError> {
        let room = sqlx::query_as::<_, ChatroomModel>(
            r"
            SELECT id, province_id, name, is_active, max_members
            FROM chatrooms
            WHERE id = $1
            ",
        )
        .bind(chatroom_id.into_inner())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(match room {
            None => DomainError::ChatroomNotFound(chatroom_id),
            Some(room) if !room.is_active => DomainError::ChatroomInactive,
            Some(room) => DomainError::ChatroomFull {
                max: room.max_members,
            },
        })
    }
}

#[async_trait]
impl MembershipRepository for PgMembershipRepository {
    #[instrument(skip(self))]
    async fn join(
        &self,
        chatroom_id: Snowflake,
        user_id: Snowflake,
        at: DateTime<Utc>,
    ) -> RepoResult<JoinOutcome> {
        // One statement: the primary key makes concurrent joins collapse
        // into a single row; the room guard rejects inactive or full rooms.
        let inserted = sqlx::query_as::<_, MembershipModel>(
            r"
            INSERT INTO chatroom_members (chatroom_id, user_id, joined_at)
            SELECT c.id, $2, $3
            FROM chatrooms c
            WHERE c.id = $1
              AND c.is_active
              AND (c.max_members <= 0
                   OR (SELECT COUNT(*) FROM chatroom_members m WHERE m.chatroom_id = c.id) < c.max_members)
            ON CONFLICT (chatroom_id, user_id) DO NOTHING
            RETURNING chatroom_id, user_id, joined_at
            ",
        )
        .bind(chatroom_id.into_inner())
        .bind(user_id.into_inner())
        .bind(at)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        if let Some(model) = inserted {
            debug!(%chatroom_id, %user_id, "joined chatroom");
            return Ok(JoinOutcome::Joined(model.into()));
        }

        if let Some(existing) = self.find(chatroom_id.into_inner(), user_id.into_inner()).await? {
            return Ok(JoinOutcome::AlreadyMember(existing.into()));
        }

        Err(self.rejection_reason(chatroom_id).await?)
    }

    #[instrument(skip(self))]
    async fn leave(&self, chatroom_id: Snowflake, user_id: Snowflake) -> RepoResult<bool> {
        let result = sqlx::query(
            r"
            DELETE FROM chatroom_members
            WHERE chatroom_id = $1 AND user_id = $2
            ",
        )
        .bind(chatroom_id.into_inner())
        .bind(user_id.into_inner())
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self))]
    async fn is_member(&self, chatroom_id: Snowflake, user_id: Snowflake) -> RepoResult<bool> {
        sqlx::query_scalar::<_, bool>(
            r"
            SELECT EXISTS(
                SELECT 1 FROM chatroom_members WHERE chatroom_id = $1 AND user_id = $2
            )
            ",
        )
        .bind(chatroom_id.into_inner())
        .bind(user_id.into_inner())
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_error)
    }

    #[instrument(skip(self))]
    async fn count(&self, chatroom_id: Snowflake) -> RepoResult<i64> {
        sqlx::query_scalar::<_, i64>(
            r"
            SELECT COUNT(*) FROM chatroom_members WHERE chatroom_id = $1
            ",
        )
        .bind(chatroom_id.into_inner())
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_error)
    }

    #[instrument(skip(self))]
    async fn list_members(&self, chatroom_id: Snowflake) -> RepoResult<Vec<ChatroomMembership>> {
        let results = sqlx::query_as::<_, MembershipModel>(
            r"
            SELECT chatroom_id, user_id, joined_at
            FROM chatroom_members
            WHERE chatroom_id = $1
            ORDER BY joined_at, user_id
            ",
        )
        .bind(chatroom_id.into_inner())
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(results.into_iter().map(ChatroomMembership::from).collect())
    }

    #[instrument(skip(self))]
    async fn list_for_user(&self, user_id: Snowflake) -> RepoResult<Vec<Chatroom>> {
        let results = sqlx::query_as::<_, ChatroomModel>(
            r"
            SELECT c.id, c.province_id, c.name, c.is_active, c.max_members
            FROM chatrooms c
            JOIN chatroom_members m ON m.chatroom_id = c.id
            WHERE m.user_id = $1
            ORDER BY m.joined_at DESC
            ",
        )
        .bind(user_id.into_inner())
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(results.into_iter().map(Chatroom::from).collect())
    }
}
