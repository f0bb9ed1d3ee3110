//! Catalog and membership model -> entity mappers

use roomchat_core::entities::{Chatroom, ChatroomMembership, Province, Region};
use roomchat_core::value_objects::Snowflake;

use crate::models::{ChatroomModel, MembershipModel, ProvinceModel, RegionModel};

impl From<RegionModel> for Region {
    fn from(model: RegionModel) -> Self {
        Region {
            id: Snowflake::new(model.id),
            name: model.name,
            order_sequence: model.order_sequence,
        }
    }
}

impl From<ProvinceModel> for Province {
    fn from(model: ProvinceModel) -> Self {
        Province {
            id: Snowflake::new(model.id),
            region_id: Snowflake::new(model.region_id),
            name: model.name,
            order_sequence: model.order_sequence,
        }
    }
}

impl From<ChatroomModel> for Chatroom {
    fn from(model: ChatroomModel) -> Self {
        Chatroom {
            id: Snowflake::new(model.id),
            province_id: Snowflake::new(model.province_id),
            name: model.name,
            is_active: model.is_active,
            max_members: model.max_members,
        }
    }
}

impl From<MembershipModel> for ChatroomMembership {
    fn from(model: MembershipModel) -> Self {
        ChatroomMembership {
            chatroom_id: Snowflake::new(model.chatroom_id),
            user_id: Snowflake::new(model.user_id),
            joined_at: model.joined_at,
        }
    }
}
