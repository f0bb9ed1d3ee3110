//! Domain entities - core business objects

mod avatar;
mod chatroom;
mod direct_message;
mod membership;
mod message;
mod profile;
mod rate_limit;
mod session;
mod storage;

pub use avatar::{fallback_avatar_url, generated_avatar_url, AvatarUrls};
pub use chatroom::{Chatroom, Province, Region};
pub use direct_message::{ConversationId, ConversationSummary, DirectMessage, NewDirectMessage};
pub use membership::{ChatroomMembership, JoinOutcome};
pub use message::{Message, MessageWithAuthor, NewMessage, DELETED_PLACEHOLDER};
pub use profile::{Profile, ProfileChanges, ProfileSummary};
pub use rate_limit::{RateLimitAction, RateLimitCounter, RateLimitDecision, RateLimitPolicy};
pub use session::{AuthUser, Session};
pub use storage::{avatar_object_path, StoredObject, AVATAR_BUCKET};
