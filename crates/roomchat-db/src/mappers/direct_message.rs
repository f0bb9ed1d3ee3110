//! Direct message model -> entity mappers

use roomchat_core::entities::{ConversationId, ConversationSummary, DirectMessage};
use roomchat_core::value_objects::Snowflake;

use crate::models::{ConversationSummaryModel, DirectMessageModel};

impl From<DirectMessageModel> for DirectMessage {
    fn from(model: DirectMessageModel) -> Self {
        DirectMessage {
            id: Snowflake::new(model.id),
            sender_id: Snowflake::new(model.sender_id),
            receiver_id: Snowflake::new(model.receiver_id),
            conversation_id: ConversationId::from(model.conversation_id),
            content: model.content,
            created_at: model.created_at,
            read_at: model.read_at,
        }
    }
}

/// Summary as seen by `reader`
pub fn summary_from_model(model: ConversationSummaryModel, reader: Snowflake) -> ConversationSummary {
    let unread_count = model.unread_count;
    let last_message = DirectMessage::from(DirectMessageModel {
        id: model.id,
        sender_id: model.sender_id,
        receiver_id: model.receiver_id,
        conversation_id: model.conversation_id,
        content: model.content,
        created_at: model.created_at,
        read_at: model.read_at,
    });

    ConversationSummary {
        conversation_id: last_message.conversation_id.clone(),
        counterpart_id: last_message.counterpart(reader),
        counterpart: None,
        last_message,
        unread_count,
    }
}
