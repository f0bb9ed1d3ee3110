//! Catalog service: regions, provinces, chatrooms

use roomchat_core::{Chatroom, DomainError, Province, Region, Snowflake};
use tracing::instrument;

use super::context::ServiceContext;
use super::error::ServiceResult;

/// Catalog service
pub struct CatalogService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> CatalogService<'a> {
    /// Create a new CatalogService
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    #[instrument(skip(self))]
    pub async fn list_regions(&self) -> ServiceResult<Vec<Region>> {
        Ok(self.ctx.chatrooms().list_regions().await?)
    }

    #[instrument(skip(self))]
    pub async fn list_provinces(&self, region_id: Snowflake) -> ServiceResult<Vec<Province>> {
        Ok(self.ctx.chatrooms().list_provinces(region_id).await?)
    }

    /// Active chatrooms of a province
    #[instrument(skip(self))]
    pub async fn list_chatrooms(&self, province_id: Snowflake) -> ServiceResult<Vec<Chatroom>> {
        Ok(self.ctx.chatrooms().list_by_province(province_id).await?)
    }

    #[instrument(skip(self))]
    pub async fn get_chatroom(&self, chatroom_id: Snowflake) -> ServiceResult<Chatroom> {
        self.ctx
            .chatrooms()
            .find_by_id(chatroom_id)
            .await?
            .ok_or_else(|| DomainError::ChatroomNotFound(chatroom_id).into())
    }
}
