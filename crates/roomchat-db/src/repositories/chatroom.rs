//! PostgreSQL implementation of ChatroomRepository

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::instrument;

use roomchat_core::entities::{Chatroom, Province, Region};
use roomchat_core::traits::{ChatroomRepository, RepoResult};
use roomchat_core::value_objects::Snowflake;

use crate::models::{ChatroomModel, ProvinceModel, RegionModel};

use super::error::map_db_error;

/// PostgreSQL implementation of ChatroomRepository
#[derive(Clone)]
pub struct PgChatroomRepository {
    pool: PgPool,
}

impl PgChatroomRepository {
    /// Create a new PgChatroomRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ChatroomRepository for PgChatroomRepository {
    #[instrument(skip(self))]
    async fn list_regions(&self) -> RepoResult<Vec<Region>> {
        let results = sqlx::query_as::<_, RegionModel>(
            r"
            SELECT id, name, order_sequence
            FROM regions
            ORDER BY order_sequence, id
            ",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(results.into_iter().map(Region::from).collect())
    }

    #[instrument(skip(self))]
    async fn list_provinces(&self, region_id: Snowflake) -> RepoResult<Vec<Province>> {
        let results = sqlx::query_as::<_, ProvinceModel>(
            r"
            SELECT id, region_id, name, order_sequence
            FROM provinces
            WHERE region_id = $1
            ORDER BY order_sequence, id
            ",
        )
        .bind(region_id.into_inner())
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(results.into_iter().map(Province::from).collect())
    }

    #[instrument(skip(self))]
    async fn list_by_province(&self, province_id: Snowflake) -> RepoResult<Vec<Chatroom>> {
        let results = sqlx::query_as::<_, ChatroomModel>(
            r"
            SELECT id, province_id, name, is_active, max_members
            FROM chatrooms
            WHERE province_id = $1 AND is_active
            ORDER BY name, id
            ",
        )
        .bind(province_id.into_inner())
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(results.into_iter().map(Chatroom::from).collect())
    }

    #[instrument(skip(self))]
    async fn find_by_id(&self, id: Snowflake) -> RepoResult<Option<Chatroom>> {
        let result = sqlx::query_as::<_, ChatroomModel>(
            r"
            SELECT id, province_id, name, is_active, max_members
            FROM chatrooms
            WHERE id = $1
            ",
        )
        .bind(id.into_inner())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.map(Chatroom::from))
    }
}
