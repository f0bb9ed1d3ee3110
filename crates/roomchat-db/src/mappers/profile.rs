//! Profile model -> entity mapper

use roomchat_core::entities::Profile;
use roomchat_core::value_objects::{Role, Snowflake};

use crate::models::ProfileModel;

impl From<ProfileModel> for Profile {
    fn from(model: ProfileModel) -> Self {
        Profile {
            id: Snowflake::new(model.id),
            username: model.username,
            display_name: model.display_name,
            avatar_url: model.avatar_url,
            // The CHECK constraint keeps this in range
            role: model.role.parse::<Role>().unwrap_or_default(),
            status_message: model.status_message,
            push_token: model.push_token,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}
