//! Catalog entities - regions, provinces, and the chatrooms they seed

use serde::{Deserialize, Serialize};

use crate::value_objects::Snowflake;

/// Top level of the static location hierarchy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub id: Snowflake,
    pub name: String,
    pub order_sequence: i32,
}

/// Province within a region
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Province {
    pub id: Snowflake,
    pub region_id: Snowflake,
    pub name: String,
    pub order_sequence: i32,
}

/// Chatroom scoped to a province
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chatroom {
    pub id: Snowflake,
    pub province_id: Snowflake,
    pub name: String,
    pub is_active: bool,
    pub max_members: i32,
}

impl Chatroom {
    pub fn new(id: Snowflake, province_id: Snowflake, name: String, max_members: i32) -> Self {
        Self {
            id,
            province_id,
            name,
            is_active: true,
            max_members,
        }
    }

    /// Whether one more member fits; a non-positive cap means unlimited
    pub fn has_capacity(&self, current_members: i64) -> bool {
        self.max_members <= 0 || current_members < i64::from(self.max_members)
    }
}
