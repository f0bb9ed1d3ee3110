//! Database models - SQLx-compatible structs for PostgreSQL tables

mod auth;
mod chatroom;
mod direct_message;
mod message;
mod profile;
mod rate_limit;

pub use auth::{AuthUserModel, RefreshTokenModel};
pub use chatroom::{ChatroomModel, MembershipModel, ProvinceModel, RegionModel};
pub use direct_message::{ConversationSummaryModel, DirectMessageModel};
pub use message::MessageModel;
pub use profile::ProfileModel;
pub use rate_limit::RateLimitModel;
