//! Profile entity - public face of a signed-up account

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::value_objects::{Role, Snowflake};

/// Profile row, keyed by the auth user id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub id: Snowflake,
    pub username: String,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub role: Role,
    pub status_message: Option<String>,
    /// Written by the device registration flow, read when relaying DM pushes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub push_token: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Profile {
    /// Create a new Profile with the default role
    pub fn new(id: Snowflake, username: String) -> Self {
        let now = Utc::now();
        Self {
            id,
            username,
            display_name: None,
            avatar_url: None,
            role: Role::User,
            status_message: None,
            push_token: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Name to show in lists: display name when set, otherwise the username
    pub fn display_label(&self) -> &str {
        self.display_name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(&self.username)
    }

    #[inline]
    pub fn can_moderate(&self) -> bool {
        self.role.can_moderate()
    }

    pub fn set_username(&mut self, username: String) {
        self.username = username;
        self.updated_at = Utc::now();
    }

    pub fn set_avatar_url(&mut self, avatar_url: Option<String>) {
        self.avatar_url = avatar_url;
        self.updated_at = Utc::now();
    }

    /// Apply a partial update; `None` leaves the field untouched, `Some("")` clears it
    pub fn apply(&mut self, changes: ProfileChanges) {
        if let Some(display_name) = changes.display_name {
            self.display_name = non_empty(display_name);
        }
        if let Some(status_message) = changes.status_message {
            self.status_message = non_empty(status_message);
        }
        self.updated_at = Utc::now();
    }
}

fn non_empty(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}

/// Editable profile fields
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileChanges {
    pub display_name: Option<String>,
    pub status_message: Option<String>,
}

impl ProfileChanges {
    pub fn is_empty(&self) -> bool {
        self.display_name.is_none() && self.status_message.is_none()
    }
}

/// Author info joined onto messages
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileSummary {
    pub id: Snowflake,
    pub username: String,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
    pub role: Role,
}

impl From<&Profile> for ProfileSummary {
    fn from(profile: &Profile) -> Self {
        Self {
            id: profile.id,
            username: profile.username.clone(),
            display_name: profile.display_name.clone(),
            avatar_url: profile.avatar_url.clone(),
            role: profile.role,
        }
    }
}
