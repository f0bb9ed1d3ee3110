//! Message entity - a chatroom message

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entities::ProfileSummary;
use crate::value_objects::Snowflake;

/// Text shown in place of a soft-deleted message
pub const DELETED_PLACEHOLDER: &str = "This message has been deleted.";

/// Message entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: Snowflake,
    pub chatroom_id: Snowflake,
    pub user_id: Snowflake,
    /// Stored HTML-escaped
    pub content: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub is_edited: bool,
    #[serde(default)]
    pub is_deleted: bool,
    pub bubble_color: Option<String>,
}

impl Message {
    /// Create a new Message; `content` must already be validated and escaped
    pub fn new(id: Snowflake, chatroom_id: Snowflake, user_id: Snowflake, content: String) -> Self {
        Self {
            id,
            chatroom_id,
            user_id,
            content,
            created_at: id.created_at(),
            is_edited: false,
            is_deleted: false,
            bubble_color: None,
        }
    }

    pub fn with_bubble_color(mut self, color: Option<String>) -> Self {
        self.bubble_color = color;
        self
    }

    /// Replace the content (already escaped) and flag the message as edited
    pub fn edit(&mut self, content: String) {
        self.content = content;
        self.is_edited = true;
    }

    /// Soft delete: the row stays so the conversation keeps its shape
    pub fn soft_delete(&mut self) {
        self.is_deleted = true;
    }

    #[inline]
    pub fn is_authored_by(&self, user_id: Snowflake) -> bool {
        self.user_id == user_id
    }

    /// Content to render; deleted messages render a placeholder
    pub fn display_content(&self) -> &str {
        if self.is_deleted {
            DELETED_PLACEHOLDER
        } else {
            &self.content
        }
    }

    /// Get a truncated preview of the message (for notifications)
    pub fn preview(&self, max_chars: usize) -> &str {
        preview(self.display_content(), max_chars)
    }
}

/// Truncate to at most `max_chars` characters without splitting a code point
pub(crate) fn preview(content: &str, max_chars: usize) -> &str {
    match content.char_indices().nth(max_chars) {
        Some((end, _)) => &content[..end],
        None => content,
    }
}

/// A message as submitted; the backend assigns `id` and `created_at`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMessage {
    pub chatroom_id: Snowflake,
    pub user_id: Snowflake,
    /// Already validated and escaped
    pub content: String,
    pub bubble_color: Option<String>,
}

impl NewMessage {
    pub fn new(chatroom_id: Snowflake, user_id: Snowflake, content: String) -> Self {
        Self {
            chatroom_id,
            user_id,
            content,
            bubble_color: None,
        }
    }

    pub fn with_bubble_color(mut self, color: Option<String>) -> Self {
        self.bubble_color = color;
        self
    }

    /// Materialize the stored row under a backend-assigned id
    pub fn assign(self, id: Snowflake) -> Message {
        Message::new(id, self.chatroom_id, self.user_id, self.content).with_bubble_color(self.bubble_color)
    }
}

/// Message joined with its author's profile summary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageWithAuthor {
    #[serde(flatten)]
    pub message: Message,
    /// `None` when the author row is no longer readable
    pub author: Option<ProfileSummary>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Message {
        Message::new(
            Snowflake::new(1 << 22),
            Snowflake::new(10),
            Snowflake::new(20),
            "hello &amp; welcome".to_string(),
        )
    }

    #[test]
    fn test_edit_sets_flag() {
        let mut message = sample();
        assert!(!message.is_edited);
        message.edit("changed".to_string());
        assert!(message.is_edited);
        assert_eq!(message.content, "changed");
    }

    #[test]
    fn test_soft_delete_keeps_content_but_hides_it() {
        let mut message = sample();
        message.soft_delete();
        assert!(message.is_deleted);
        assert_eq!(message.content, "hello &amp; welcome");
        assert_eq!(message.display_content(), DELETED_PLACEHOLDER);
    }

    #[test]
    fn test_preview_respects_char_boundaries() {
        let mut message = sample();
        message.content = "안녕하세요 여러분".to_string();
        assert_eq!(message.preview(2), "안녕");
        assert_eq!(message.preview(100), "안녕하세요 여러분");
    }

    #[test]
    fn test_created_at_follows_id() {
        let message = sample();
        assert_eq!(message.created_at, message.id.created_at());
    }

    #[test]
    fn test_assign_keeps_draft_fields() {
        let draft = NewMessage::new(Snowflake::new(10), Snowflake::new(20), "hi".to_string())
            .with_bubble_color(Some("#A1B2C3".to_string()));
        let message = draft.assign(Snowflake::new(5 << 22));
        assert_eq!(message.id, Snowflake::new(5 << 22));
        assert_eq!(message.chatroom_id, Snowflake::new(10));
        assert_eq!(message.bubble_color.as_deref(), Some("#A1B2C3"));
        assert!(!message.is_edited);
    }

    #[test]
    fn test_with_author_flattens() {
        let value = serde_json::to_value(MessageWithAuthor {
            message: sample(),
            author: None,
        })
        .unwrap();
        assert_eq!(value["chatroom_id"], "10");
        assert!(value["author"].is_null());
    }
}
