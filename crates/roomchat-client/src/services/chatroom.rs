//! Chatroom membership service
//!
//! Joining is a single idempotent insert keyed on `(chatroom_id, user_id)`;
//! there is no separate "am I a member" round trip first.

use chrono::Utc;
use roomchat_core::{Chatroom, JoinOutcome, Snowflake};
use tracing::{info, instrument};

use crate::dto::mappers::attach_member_profiles;
use crate::dto::MemberResponse;

use super::context::ServiceContext;
use super::error::ServiceResult;

/// Chatroom service
pub struct ChatroomService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> ChatroomService<'a> {
    /// Create a new ChatroomService
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Ensure the user is a member, joining if needed
    ///
    /// Fails when the chatroom does not exist, is inactive, or is full.
    #[instrument(skip(self))]
    pub async fn verify_or_join(
        &self,
        chatroom_id: Snowflake,
        user_id: Snowflake,
    ) -> ServiceResult<JoinOutcome> {
        let outcome = self
            .ctx
            .memberships()
            .join(chatroom_id, user_id, Utc::now())
            .await?;

        if outcome.is_new() {
            info!(chatroom_id = %chatroom_id, user_id = %user_id, "Joined chatroom");
        }

        Ok(outcome)
    }

    /// Leave a chatroom; returns whether a membership was removed
    #[instrument(skip(self))]
    pub async fn leave(&self, chatroom_id: Snowflake, user_id: Snowflake) -> ServiceResult<bool> {
        let removed = self.ctx.memberships().leave(chatroom_id, user_id).await?;
        if removed {
            info!(chatroom_id = %chatroom_id, user_id = %user_id, "Left chatroom");
        }
        Ok(removed)
    }

    #[instrument(skip(self))]
    pub async fn is_member(&self, chatroom_id: Snowflake, user_id: Snowflake) -> ServiceResult<bool> {
        Ok(self.ctx.memberships().is_member(chatroom_id, user_id).await?)
    }

    #[instrument(skip(self))]
    pub async fn member_count(&self, chatroom_id: Snowflake) -> ServiceResult<i64> {
        Ok(self.ctx.memberships().count(chatroom_id).await?)
    }

    /// Members in join order, with profiles
    #[instrument(skip(self))]
    pub async fn list_members(&self, chatroom_id: Snowflake) -> ServiceResult<Vec<MemberResponse>> {
        let members = self.ctx.memberships().list_members(chatroom_id).await?;
        let ids: Vec<Snowflake> = members.iter().map(|m| m.user_id).collect();
        let profiles = if ids.is_empty() {
            Vec::new()
        } else {
            self.ctx.profiles().find_many(&ids).await?
        };

        Ok(attach_member_profiles(members, &profiles))
    }

    /// Chatrooms the user belongs to
    #[instrument(skip(self))]
    pub async fn my_chatrooms(&self, user_id: Snowflake) -> ServiceResult<Vec<Chatroom>> {
        Ok(self.ctx.memberships().list_for_user(user_id).await?)
    }
}
