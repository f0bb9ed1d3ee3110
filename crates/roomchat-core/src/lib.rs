//! # roomchat-core
//!
//! Domain layer containing entities, value objects, validation rules,
//! change events, and the ports backend adapters implement.
//! This crate has zero dependencies on infrastructure (database, cache, HTTP).

pub mod entities;
pub mod error;
pub mod events;
pub mod traits;
pub mod validation;
pub mod value_objects;

// Re-export commonly used types at crate root
pub use entities::{
    AuthUser, AvatarUrls, Chatroom, ChatroomMembership, ConversationId, ConversationSummary,
    DirectMessage, JoinOutcome, Message, MessageWithAuthor, NewDirectMessage, NewMessage, Profile,
    ProfileChanges, ProfileSummary, Province, RateLimitAction, RateLimitCounter, RateLimitDecision,
    RateLimitPolicy, Region, Session, StoredObject,
};
pub use error::DomainError;
pub use events::{ChangeEvent, ChangeFilter, ChangeType, Subscription, Table};
pub use traits::{
    AuthProvider, ChangePublisher, ChangeStream, ChatroomRepository, DirectMessageRepository,
    MembershipRepository, MessageQuery, MessageRepository, ObjectStorage, ProfileRepository,
    RateLimitRepository, RealtimeFeed, RepoResult,
};
pub use value_objects::{ChangeKinds, Role, Snowflake, SnowflakeGenerator, SnowflakeParseError};
