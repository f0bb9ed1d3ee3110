//! Direct message service
//!
//! One-to-one conversations keyed by a deterministic conversation id.

use chrono::Utc;
use roomchat_core::traits::MessageQuery;
use roomchat_core::validation::validate_content;
use roomchat_core::{
    ConversationId, ConversationSummary, DirectMessage, DomainError, NewDirectMessage, Profile,
    RateLimitAction, Snowflake,
};
use tracing::{debug, info, instrument, warn};

use crate::dto::mappers::attach_counterparts;
use crate::dto::{MessagePage, SendDirectMessageRequest};
use crate::http::PushMessage;

use super::context::ServiceContext;
use super::error::ServiceResult;
use super::message::{charge_quota, PAGE_SIZE};

/// Characters of message body included in a push
const PUSH_PREVIEW_CHARS: usize = 100;

/// Direct message service
pub struct DirectMessageService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> DirectMessageService<'a> {
    /// Create a new DirectMessageService
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Send a direct message, then relay a push if the receiver has a token
    #[instrument(skip(self, request), fields(receiver_id = %request.receiver_id))]
    pub async fn send(
        &self,
        sender_id: Snowflake,
        request: SendDirectMessageRequest,
    ) -> ServiceResult<DirectMessage> {
        let content = validate_content(&request.content)?;
        if sender_id == request.receiver_id {
            return Err(DomainError::CannotMessageSelf.into());
        }

        let receiver = self
            .ctx
            .profiles()
            .find_by_id(request.receiver_id)
            .await?
            .ok_or(DomainError::ProfileNotFound(request.receiver_id))?;

        charge_quota(self.ctx, sender_id, RateLimitAction::SendDirectMessage).await?;

        let draft = NewDirectMessage::new(sender_id, receiver.id, content);
        let message = self.ctx.direct_messages().create(&draft).await?;
        info!(message_id = %message.id, "Direct message sent");

        self.notify(&receiver, &message).await;
        Ok(message)
    }

    /// One page of the conversation with `other`, newest first
    #[instrument(skip(self))]
    pub async fn list_conversation(
        &self,
        me: Snowflake,
        other: Snowflake,
        before: Option<Snowflake>,
    ) -> ServiceResult<MessagePage<DirectMessage>> {
        let conversation = ConversationId::between(me, other);
        let messages = self
            .ctx
            .direct_messages()
            .find_conversation_page(&conversation, MessageQuery::before(before, PAGE_SIZE as i64))
            .await?;

        Ok(MessagePage::new(messages, PAGE_SIZE, |m| m.id))
    }

    /// Latest message and unread count per counterpart, most recent first
    #[instrument(skip(self))]
    pub async fn list_conversations(&self, me: Snowflake) -> ServiceResult<Vec<ConversationSummary>> {
        let summaries = self.ctx.direct_messages().conversation_summaries(me).await?;
        if summaries.is_empty() {
            return Ok(summaries);
        }

        let ids: Vec<Snowflake> = summaries.iter().map(|s| s.counterpart_id).collect();
        let profiles = self.ctx.profiles().find_many(&ids).await?;

        Ok(attach_counterparts(summaries, &profiles))
    }

    /// Mark everything `me` received from `other` as read
    #[instrument(skip(self))]
    pub async fn mark_read(&self, me: Snowflake, other: Snowflake) -> ServiceResult<u64> {
        let conversation = ConversationId::between(me, other);
        let updated = self
            .ctx
            .direct_messages()
            .mark_conversation_read(&conversation, me, Utc::now())
            .await?;

        debug!(conversation = %conversation.as_str(), updated, "Conversation read");
        Ok(updated)
    }

    /// Unread direct messages across all conversations
    #[instrument(skip(self))]
    pub async fn unread_count(&self, me: Snowflake) -> ServiceResult<i64> {
        Ok(self.ctx.direct_messages().unread_count(me).await?)
    }

    /// Best-effort push; failures are logged, never returned
    async fn notify(&self, receiver: &Profile, message: &DirectMessage) {
        let (Some(push), Some(token)) = (self.ctx.push(), receiver.push_token.as_deref()) else {
            return;
        };

        let title = match self.ctx.profiles().find_by_id(message.sender_id).await {
            Ok(Some(sender)) => sender.display_label().to_string(),
            _ => "New message".to_string(),
        };
        let push_message = PushMessage::new(token, title, message.plain_preview(PUSH_PREVIEW_CHARS));

        if let Err(e) = push.send(&push_message).await {
            warn!(error = %e, receiver_id = %receiver.id, "Push relay failed");
        }
    }
}
