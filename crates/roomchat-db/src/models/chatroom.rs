//! Catalog and membership models

use chrono::{DateTime, Utc};
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow)]
pub struct RegionModel {
    pub id: i64,
    pub name: String,
    pub order_sequence: i32,
}

#[derive(Debug, Clone, FromRow)]
pub struct ProvinceModel {
    pub id: i64,
    pub region_id: i64,
    pub name: String,
    pub order_sequence: i32,
}

/// Database model for chatrooms table
#[derive(Debug, Clone, FromRow)]
pub struct ChatroomModel {
    pub id: i64,
    pub province_id: i64,
    pub name: String,
    pub is_active: bool,
    pub max_members: i32,
}

/// Database model for chatroom_members table
#[derive(Debug, Clone, FromRow)]
pub struct MembershipModel {
    pub chatroom_id: i64,
    pub user_id: i64,
    pub joined_at: DateTime<Utc>,
}
