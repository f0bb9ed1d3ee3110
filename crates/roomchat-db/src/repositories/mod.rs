//! Repository implementations
//!
//! PostgreSQL implementations of the port traits defined in roomchat-core.
//! Each repository handles database operations for one table group.

mod auth;
mod chatroom;
mod direct_message;
mod error;
mod membership;
mod message;
mod profile;
mod rate_limit;

pub use auth::PgAuthProvider;
pub use chatroom::PgChatroomRepository;
pub use direct_message::PgDirectMessageRepository;
pub use error::{map_app_error, map_db_error, NO_ROWS_CODE};
pub use membership::PgMembershipRepository;
pub use message::{PgMessageRepository, MAX_PAGE_SIZE};
pub use profile::PgProfileRepository;
pub use rate_limit::PgRateLimitRepository;
