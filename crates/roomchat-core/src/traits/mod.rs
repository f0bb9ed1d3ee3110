//! Ports implemented by backend adapters

mod backend;
mod repositories;

pub use backend::{AuthProvider, ChangePublisher, ChangeStream, ObjectStorage, RealtimeFeed};
pub use repositories::{
    ChatroomRepository, DirectMessageRepository, MembershipRepository, MessageQuery,
    MessageRepository, ProfileRepository, RateLimitRepository, RepoResult,
};
