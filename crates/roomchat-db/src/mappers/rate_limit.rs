//! Rate limit model -> entity mapper

use roomchat_core::entities::{RateLimitAction, RateLimitCounter};
use roomchat_core::value_objects::Snowflake;

use crate::models::RateLimitModel;

/// The action column is the key the row was looked up with
pub fn counter_from_model(model: RateLimitModel, action: RateLimitAction) -> RateLimitCounter {
    RateLimitCounter {
        user_id: Snowflake::new(model.user_id),
        action,
        count: model.count,
        window_start: model.window_start,
    }
}
