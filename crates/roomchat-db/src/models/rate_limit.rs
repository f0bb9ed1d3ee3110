//! Rate limit counter model

use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Database model for rate_limits table
#[derive(Debug, Clone, FromRow)]
pub struct RateLimitModel {
    pub user_id: i64,
    pub action: String,
    pub count: i32,
    pub window_start: DateTime<Utc>,
}
