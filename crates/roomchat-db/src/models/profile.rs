//! Profile database model

use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Database model for profiles table
#[derive(Debug, Clone, FromRow)]
pub struct ProfileModel {
    pub id: i64,
    pub username: String,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
    pub role: String,
    pub status_message: Option<String>,
    pub push_token: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
