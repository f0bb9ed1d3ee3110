//! Direct message entity and conversation identity

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::entities::message::preview;
use crate::entities::ProfileSummary;
use crate::validation::unescape_html;
use crate::value_objects::Snowflake;

/// Deterministic id shared by both participants: `"{smaller}_{larger}"`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationId(String);

impl ConversationId {
    pub fn between(a: Snowflake, b: Snowflake) -> Self {
        let (low, high) = if a <= b { (a, b) } else { (b, a) };
        Self(format!("{low}_{high}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Both participant ids, smaller first
    pub fn participants(&self) -> Option<(Snowflake, Snowflake)> {
        let (low, high) = self.0.split_once('_')?;
        Some((Snowflake::parse(low).ok()?, Snowflake::parse(high).ok()?))
    }
}

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for ConversationId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// DirectMessage entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectMessage {
    pub id: Snowflake,
    pub sender_id: Snowflake,
    pub receiver_id: Snowflake,
    pub conversation_id: ConversationId,
    /// Stored HTML-escaped
    pub content: String,
    pub created_at: DateTime<Utc>,
    /// `None` means unread
    pub read_at: Option<DateTime<Utc>>,
}

impl DirectMessage {
    pub fn new(id: Snowflake, sender_id: Snowflake, receiver_id: Snowflake, content: String) -> Self {
        Self {
            id,
            sender_id,
            receiver_id,
            conversation_id: ConversationId::between(sender_id, receiver_id),
            content,
            created_at: id.created_at(),
            read_at: None,
        }
    }

    #[inline]
    pub fn is_unread(&self) -> bool {
        self.read_at.is_none()
    }

    /// Mark read; a message already read keeps its original timestamp
    pub fn mark_read(&mut self, at: DateTime<Utc>) {
        if self.read_at.is_none() {
            self.read_at = Some(at);
        }
    }

    /// The other participant from `me`'s point of view
    pub fn counterpart(&self, me: Snowflake) -> Snowflake {
        if self.sender_id == me {
            self.receiver_id
        } else {
            self.sender_id
        }
    }

    /// Preview of the text as typed, for surfaces that do not render HTML
    pub fn plain_preview(&self, max_chars: usize) -> String {
        preview(&unescape_html(&self.content), max_chars).to_string()
    }
}

/// A direct message as submitted; the backend assigns `id` and `created_at`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewDirectMessage {
    pub sender_id: Snowflake,
    pub receiver_id: Snowflake,
    /// Already validated and escaped
    pub content: String,
}

impl NewDirectMessage {
    pub fn new(sender_id: Snowflake, receiver_id: Snowflake, content: String) -> Self {
        Self {
            sender_id,
            receiver_id,
            content,
        }
    }

    pub fn conversation_id(&self) -> ConversationId {
        ConversationId::between(self.sender_id, self.receiver_id)
    }

    pub fn assign(self, id: Snowflake) -> DirectMessage {
        DirectMessage::new(id, self.sender_id, self.receiver_id, self.content)
    }
}

/// One row of the conversation list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationSummary {
    pub conversation_id: ConversationId,
    pub counterpart_id: Snowflake,
    pub counterpart: Option<ProfileSummary>,
    pub last_message: DirectMessage,
    /// Messages received from the counterpart that are still unread
    pub unread_count: i64,
}
