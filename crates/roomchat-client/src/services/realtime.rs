//! Realtime subscriptions
//!
//! Thin helpers over [`RealtimeFeed`](roomchat_core::traits::RealtimeFeed)
//! for the subscriptions the client actually opens.

use roomchat_core::traits::ChangeStream;
use roomchat_core::{ChangeFilter, ChangeKinds, Snowflake, Subscription, Table};
use tracing::instrument;

use super::context::ServiceContext;
use super::error::ServiceResult;

/// Realtime service
pub struct RealtimeService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> RealtimeService<'a> {
    /// Create a new RealtimeService
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Any table, any filter
    #[instrument(skip(self))]
    pub async fn subscribe(&self, subscription: Subscription) -> ServiceResult<ChangeStream> {
        Ok(self.ctx.realtime().subscribe(subscription).await?)
    }

    /// Message changes in one chatroom
    pub async fn chatroom_messages(
        &self,
        chatroom_id: Snowflake,
        kinds: ChangeKinds,
    ) -> ServiceResult<ChangeStream> {
        self.subscribe(
            Subscription::table(Table::Messages)
                .kinds(kinds)
                .filter(ChangeFilter::equals("chatroom_id", chatroom_id)),
        )
        .await
    }

    /// Membership changes in one chatroom
    pub async fn chatroom_members(&self, chatroom_id: Snowflake) -> ServiceResult<ChangeStream> {
        self.subscribe(
            Subscription::table(Table::ChatroomMembers)
                .filter(ChangeFilter::equals("chatroom_id", chatroom_id)),
        )
        .await
    }

    /// Direct messages addressed to `user_id`
    pub async fn incoming_direct_messages(&self, user_id: Snowflake) -> ServiceResult<ChangeStream> {
        self.subscribe(
            Subscription::table(Table::DirectMessages)
                .filter(ChangeFilter::equals("receiver_id", user_id)),
        )
        .await
    }

    /// Every change in one conversation
    pub async fn conversation(&self, me: Snowflake, other: Snowflake) -> ServiceResult<ChangeStream> {
        let conversation = roomchat_core::ConversationId::between(me, other);
        self.subscribe(
            Subscription::table(Table::DirectMessages)
                .filter(ChangeFilter::equals("conversation_id", conversation.as_str())),
        )
        .await
    }
}
