//! Message service
//!
//! Handles chatroom message paging, sending, editing, and deletion.

use chrono::Utc;
use roomchat_core::traits::MessageQuery;
use roomchat_core::validation::{validate_bubble_color, validate_content};
use roomchat_core::{
    DomainError, Message, MessageWithAuthor, NewMessage, RateLimitAction, RateLimitDecision,
    Snowflake,
};
use tracing::{debug, info, instrument};

use crate::dto::mappers::{attach_authors, distinct_ids};
use crate::dto::{MessagePage, SendMessageRequest};

use super::context::ServiceContext;
use super::error::{ServiceError, ServiceResult};

/// Messages per page
pub const PAGE_SIZE: usize = 50;

/// Message service
pub struct MessageService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> MessageService<'a> {
    /// Create a new MessageService
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// One page of a chatroom, newest first, with authors
    ///
    /// `before` is the oldest id already shown (exclusive). Soft-deleted
    /// messages are included so they can render as placeholders.
    #[instrument(skip(self))]
    pub async fn list_messages(
        &self,
        chatroom_id: Snowflake,
        before: Option<Snowflake>,
    ) -> ServiceResult<MessagePage<MessageWithAuthor>> {
        let messages = self
            .ctx
            .messages()
            .find_page(chatroom_id, MessageQuery::before(before, PAGE_SIZE as i64))
            .await?;

        let author_ids = distinct_ids(messages.iter().map(|m| m.user_id));
        let authors = if author_ids.is_empty() {
            Vec::new()
        } else {
            self.ctx.profiles().find_many(&author_ids).await?
        };

        let items = attach_authors(messages, &authors);
        Ok(MessagePage::new(items, PAGE_SIZE, |m| m.message.id))
    }

    /// Send a message
    ///
    /// Local checks run first; the quota is charged only for a valid message
    /// from a member.
    #[instrument(skip(self, request))]
    pub async fn send_message(
        &self,
        chatroom_id: Snowflake,
        user_id: Snowflake,
        request: SendMessageRequest,
    ) -> ServiceResult<MessageWithAuthor> {
        let content = validate_content(&request.content)?;
        if let Some(color) = &request.bubble_color {
            validate_bubble_color(color)?;
        }

        if !self.ctx.memberships().is_member(chatroom_id, user_id).await? {
            return Err(DomainError::NotChatroomMember(chatroom_id).into());
        }

        charge_quota(self.ctx, user_id, RateLimitAction::SendMessage).await?;

        let draft = NewMessage::new(chatroom_id, user_id, content).with_bubble_color(request.bubble_color);
        let message = self.ctx.messages().create(&draft).await?;

        let author = self
            .ctx
            .profiles()
            .find_by_id(user_id)
            .await?
            .as_ref()
            .map(Into::into);

        info!(message_id = %message.id, chatroom_id = %chatroom_id, "Message sent");
        Ok(MessageWithAuthor { message, author })
    }

    /// Replace the content of one's own message
    #[instrument(skip(self, content))]
    pub async fn edit_message(
        &self,
        message_id: Snowflake,
        user_id: Snowflake,
        content: &str,
    ) -> ServiceResult<Message> {
        let content = validate_content(content)?;
        let mut message = self.get_live_message(message_id).await?;

        if !message.is_authored_by(user_id) {
            return Err(DomainError::NotMessageAuthor.into());
        }

        message.edit(content);
        self.ctx.messages().update(&message).await?;

        info!(message_id = %message_id, "Message edited");
        Ok(message)
    }

    /// Soft-delete a message; authors, moderators, and admins may do this
    #[instrument(skip(self))]
    pub async fn delete_message(&self, message_id: Snowflake, user_id: Snowflake) -> ServiceResult<()> {
        let message = self.get_live_message(message_id).await?;

        if !message.is_authored_by(user_id) {
            let actor = self
                .ctx
                .profiles()
                .find_by_id(user_id)
                .await?
                .ok_or(DomainError::ProfileNotFound(user_id))?;
            if !actor.can_moderate() {
                return Err(DomainError::NotMessageAuthor.into());
            }
            debug!(message_id = %message_id, moderator = %user_id, "Moderator delete");
        }

        if !self.ctx.messages().soft_delete(message_id).await? {
            return Err(DomainError::MessageNotFound(message_id).into());
        }

        info!(message_id = %message_id, "Message deleted");
        Ok(())
    }

    async fn get_live_message(&self, message_id: Snowflake) -> ServiceResult<Message> {
        self.ctx
            .messages()
            .find_by_id(message_id)
            .await?
            .filter(|m| !m.is_deleted)
            .ok_or_else(|| DomainError::MessageNotFound(message_id).into())
    }
}

/// Check and increment the user's counter for `action`
pub(crate) async fn charge_quota(
    ctx: &ServiceContext,
    user_id: Snowflake,
    action: RateLimitAction,
) -> ServiceResult<()> {
    match ctx
        .rate_limits()
        .hit(user_id, action, ctx.send_policy(), Utc::now())
        .await?
    {
        RateLimitDecision::Allowed { remaining } => {
            debug!(user_id = %user_id, %action, remaining, "Quota charged");
            Ok(())
        }
        RateLimitDecision::Limited { retry_after } => Err(ServiceError::RateLimited {
            // Round up so "0s" is never shown while still limited
            retry_after_secs: (retry_after.num_milliseconds() + 999) / 1000,
        }),
    }
}
