//! Client services
//!
//! Each service borrows a [`ServiceContext`] and shapes requests, calls
//! backend ports, and joins rows into what screens display.

pub mod auth;
pub mod avatar;
pub mod background;
pub mod catalog;
pub mod chatroom;
pub mod context;
pub mod direct_message;
pub mod error;
pub mod message;
pub mod profile;
pub mod realtime;
pub mod storage;

// Re-export all services for convenience
pub use auth::AuthService;
pub use avatar::{AvatarCache, AvatarService};
pub use background::BackgroundService;
pub use catalog::CatalogService;
pub use chatroom::ChatroomService;
pub use context::{ServiceContext, ServiceContextBuilder};
pub use direct_message::DirectMessageService;
pub use error::{ServiceError, ServiceResult};
pub use message::{MessageService, PAGE_SIZE};
pub use profile::ProfileService;
pub use realtime::RealtimeService;
pub use storage::StorageService;
