//! Message model -> entity mapper

use roomchat_core::entities::Message;
use roomchat_core::value_objects::Snowflake;

use crate::models::MessageModel;

impl From<MessageModel> for Message {
    fn from(model: MessageModel) -> Self {
        Message {
            id: Snowflake::new(model.id),
            chatroom_id: Snowflake::new(model.chatroom_id),
            user_id: Snowflake::new(model.user_id),
            content: model.content,
            created_at: model.created_at,
            is_edited: model.is_edited,
            is_deleted: model.is_deleted,
            bubble_color: model.bubble_color,
        }
    }
}
