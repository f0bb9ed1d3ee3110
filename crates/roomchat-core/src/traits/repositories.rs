//! Repository traits (ports) - relational data access
//!
//! Each trait maps to one backend table (or a closely related group). The
//! Postgres adapter and the in-memory adapter both implement all of them.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::entities::{
    Chatroom, ChatroomMembership, ConversationId, ConversationSummary, DirectMessage, JoinOutcome,
    Message, NewDirectMessage, NewMessage, Profile, Province, RateLimitAction, RateLimitDecision,
    RateLimitPolicy, Region,
};
use crate::error::DomainError;
use crate::value_objects::Snowflake;

/// Result type for repository operations
pub type RepoResult<T> = Result<T, DomainError>;

// ============================================================================
// Profile Repository
// ============================================================================

#[async_trait]
pub trait ProfileRepository: Send + Sync {
    /// Find profile by ID
    async fn find_by_id(&self, id: Snowflake) -> RepoResult<Option<Profile>>;

    /// Find profile by exact username
    async fn find_by_username(&self, username: &str) -> RepoResult<Option<Profile>>;

    /// Batch lookup; missing ids are skipped
    async fn find_many(&self, ids: &[Snowflake]) -> RepoResult<Vec<Profile>>;

    /// Usernames starting with `prefix` (case-insensitive), ordered by username
    async fn search_by_username(&self, prefix: &str, limit: i64) -> RepoResult<Vec<Profile>>;

    async fn username_exists(&self, username: &str) -> RepoResult<bool>;

    /// Insert a profile row (`UsernameTaken` on conflict)
    async fn create(&self, profile: &Profile) -> RepoResult<()>;

    /// Persist every editable column (`UsernameTaken` on conflict)
    async fn update(&self, profile: &Profile) -> RepoResult<()>;
}

// ============================================================================
// Catalog Repository
// ============================================================================

#[async_trait]
pub trait ChatroomRepository: Send + Sync {
    /// All regions ordered by `order_sequence`
    async fn list_regions(&self) -> RepoResult<Vec<Region>>;

    /// Provinces of a region ordered by `order_sequence`
    async fn list_provinces(&self, region_id: Snowflake) -> RepoResult<Vec<Province>>;

    /// Active chatrooms of a province
    async fn list_by_province(&self, province_id: Snowflake) -> RepoResult<Vec<Chatroom>>;

    async fn find_by_id(&self, id: Snowflake) -> RepoResult<Option<Chatroom>>;
}

// ============================================================================
// Membership Repository
// ============================================================================

#[async_trait]
pub trait MembershipRepository: Send + Sync {
    /// Idempotent insert keyed on `(chatroom_id, user_id)`
    ///
    /// Rejects with `ChatroomNotFound`, `ChatroomInactive`, or `ChatroomFull`
    /// when no row exists yet and none can be added. Concurrent calls for the
    /// same pair leave exactly one row.
    async fn join(
        &self,
        chatroom_id: Snowflake,
        user_id: Snowflake,
        at: DateTime<Utc>,
    ) -> RepoResult<JoinOutcome>;

    /// Remove membership; returns whether a row was deleted
    async fn leave(&self, chatroom_id: Snowflake, user_id: Snowflake) -> RepoResult<bool>;

    async fn is_member(&self, chatroom_id: Snowflake, user_id: Snowflake) -> RepoResult<bool>;

    async fn count(&self, chatroom_id: Snowflake) -> RepoResult<i64>;

    /// Members ordered by join time
    async fn list_members(&self, chatroom_id: Snowflake) -> RepoResult<Vec<ChatroomMembership>>;

    /// Chatrooms the user belongs to
    async fn list_for_user(&self, user_id: Snowflake) -> RepoResult<Vec<Chatroom>>;
}

// ============================================================================
// Message Repository
// ============================================================================

/// Cursor options for message queries
///
/// Results are always newest first. `before` and `after` are exclusive
/// bounds on the id.
#[derive(Debug, Clone, Default)]
pub struct MessageQuery {
    pub before: Option<Snowflake>,
    pub after: Option<Snowflake>,
    pub limit: i64,
}

impl MessageQuery {
    pub fn latest(limit: i64) -> Self {
        Self {
            before: None,
            after: None,
            limit,
        }
    }

    pub fn before(cursor: Option<Snowflake>, limit: i64) -> Self {
        Self {
            before: cursor,
            after: None,
            limit,
        }
    }

    /// Whether `id` falls inside the bounds
    pub fn admits(&self, id: Snowflake) -> bool {
        self.before.is_none_or(|b| id < b) && self.after.is_none_or(|a| id > a)
    }
}

#[async_trait]
pub trait MessageRepository: Send + Sync {
    /// Find message by ID
    async fn find_by_id(&self, id: Snowflake) -> RepoResult<Option<Message>>;

    /// Page of a chatroom's messages, soft-deleted rows included
    async fn find_page(&self, chatroom_id: Snowflake, query: MessageQuery)
        -> RepoResult<Vec<Message>>;

    /// Insert a message; the backend assigns `id` and `created_at`
    async fn create(&self, message: &NewMessage) -> RepoResult<Message>;

    /// Persist content and `is_edited`
    async fn update(&self, message: &Message) -> RepoResult<()>;

    /// Set `is_deleted`; returns false when the message does not exist
    async fn soft_delete(&self, id: Snowflake) -> RepoResult<bool>;
}

// ============================================================================
// Direct Message Repository
// ============================================================================

#[async_trait]
pub trait DirectMessageRepository: Send + Sync {
    async fn find_by_id(&self, id: Snowflake) -> RepoResult<Option<DirectMessage>>;

    /// Page of one conversation, newest first
    async fn find_conversation_page(
        &self,
        conversation_id: &ConversationId,
        query: MessageQuery,
    ) -> RepoResult<Vec<DirectMessage>>;

    /// Insert a direct message; the backend assigns `id` and `created_at`
    async fn create(&self, message: &NewDirectMessage) -> RepoResult<DirectMessage>;

    /// Set `read_at` on unread messages `reader_id` received in the conversation
    ///
    /// Returns the number of rows changed.
    async fn mark_conversation_read(
        &self,
        conversation_id: &ConversationId,
        reader_id: Snowflake,
        at: DateTime<Utc>,
    ) -> RepoResult<u64>;

    /// Unread messages received by `user_id` across all conversations
    async fn unread_count(&self, user_id: Snowflake) -> RepoResult<i64>;

    /// Latest message and unread count per conversation, most recent first
    ///
    /// `counterpart` is left empty; callers join profiles.
    async fn conversation_summaries(&self, user_id: Snowflake) -> RepoResult<Vec<ConversationSummary>>;
}

// ============================================================================
// Rate Limit Repository
// ============================================================================

#[async_trait]
pub trait RateLimitRepository: Send + Sync {
    /// Check and increment the counter row in one atomic step
    async fn hit(
        &self,
        user_id: Snowflake,
        action: RateLimitAction,
        policy: &RateLimitPolicy,
        now: DateTime<Utc>,
    ) -> RepoResult<RateLimitDecision>;
}
