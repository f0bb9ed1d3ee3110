//! Chatroom membership - presence in a room is membership

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::value_objects::Snowflake;

/// Membership row, unique on `(chatroom_id, user_id)`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatroomMembership {
    pub chatroom_id: Snowflake,
    pub user_id: Snowflake,
    pub joined_at: DateTime<Utc>,
}

impl ChatroomMembership {
    pub fn new(chatroom_id: Snowflake, user_id: Snowflake, joined_at: DateTime<Utc>) -> Self {
        Self {
            chatroom_id,
            user_id,
            joined_at,
        }
    }
}

/// Result of the idempotent join
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JoinOutcome {
    /// A new row was inserted
    Joined(ChatroomMembership),
    /// The row already existed; it is returned unchanged
    AlreadyMember(ChatroomMembership),
}

impl JoinOutcome {
    pub fn membership(&self) -> &ChatroomMembership {
        match self {
            Self::Joined(m) | Self::AlreadyMember(m) => m,
        }
    }

    pub fn into_membership(self) -> ChatroomMembership {
        match self {
            Self::Joined(m) | Self::AlreadyMember(m) => m,
        }
    }

    #[inline]
    pub fn is_new(&self) -> bool {
        matches!(self, Self::Joined(_))
    }
}
