//! Direct message database models

use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Database model for direct_messages table
#[derive(Debug, Clone, FromRow)]
pub struct DirectMessageModel {
    pub id: i64,
    pub sender_id: i64,
    pub receiver_id: i64,
    pub conversation_id: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub read_at: Option<DateTime<Utc>>,
}

/// Latest message of a conversation plus the reader's unread count
#[derive(Debug, Clone, FromRow)]
pub struct ConversationSummaryModel {
    pub id: i64,
    pub sender_id: i64,
    pub receiver_id: i64,
    pub conversation_id: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub read_at: Option<DateTime<Utc>>,
    pub unread_count: i64,
}
