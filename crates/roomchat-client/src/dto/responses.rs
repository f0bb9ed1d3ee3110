//! Response DTOs returned by services
//!
//! Snowflake IDs are serialized as strings.

use chrono::{DateTime, Utc};
use roomchat_core::{Profile, ProfileSummary, Session, Snowflake};
use serde::Serialize;

/// Result of sign-up or sign-in
#[derive(Debug, Clone, Serialize)]
pub struct AuthResponse {
    pub session: Session,
    pub profile: Profile,
}

/// One page of a newest-first message list
#[derive(Debug, Clone, Serialize)]
pub struct MessagePage<T> {
    pub items: Vec<T>,
    /// Pass as `before` to load older items; `None` once the start is reached
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<Snowflake>,
}

impl<T> MessagePage<T> {
    /// Build a page; a full page reports its oldest id as the next cursor
    pub fn new(items: Vec<T>, page_size: usize, id_of: impl Fn(&T) -> Snowflake) -> Self {
        let next_cursor = if items.len() >= page_size {
            items.last().map(id_of)
        } else {
            None
        };
        Self { items, next_cursor }
    }

    #[inline]
    pub fn has_more(&self) -> bool {
        self.next_cursor.is_some()
    }
}

/// Chatroom member with profile
#[derive(Debug, Clone, Serialize)]
pub struct MemberResponse {
    pub user_id: Snowflake,
    pub joined_at: DateTime<Utc>,
    pub profile: Option<ProfileSummary>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_page_has_cursor() {
        let ids: Vec<Snowflake> = (1..=3).rev().map(Snowflake::new).collect();
        let page = MessagePage::new(ids, 3, |id| *id);
        assert_eq!(page.next_cursor, Some(Snowflake::new(1)));
        assert!(page.has_more());
    }

    #[test]
    fn test_short_page_has_no_cursor() {
        let page = MessagePage::new(vec![Snowflake::new(5)], 3, |id| *id);
        assert!(!page.has_more());

        let json = serde_json::to_value(&page).unwrap();
        assert!(json.get("next_cursor").is_none());
    }
}
