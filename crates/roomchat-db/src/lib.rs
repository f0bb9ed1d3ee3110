//! # roomchat-db
//!
//! Backend adapters implementing the roomchat-core ports.
//!
//! ## Overview
//!
//! - PostgreSQL repositories and auth provider (SQLx), with embedded migrations
//! - [`realtime::ChangeListener`], which turns row-trigger NOTIFYs into change events
//! - [`storage::LocalObjectStorage`], a filesystem object store
//! - [`memory::MemoryBackend`], every port in memory, for tests and offline use
//!
//! ## Usage
//!
//! ```rust,ignore
//! use roomchat_common::AppConfig;
//! use roomchat_core::traits::ProfileRepository;
//! use roomchat_db::{create_pool, PgProfileRepository};
//!
//! async fn example() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AppConfig::from_env()?;
//!     let pool = create_pool(&config.database).await?;
//!     let profiles = PgProfileRepository::new(pool);
//!
//!     let alice = profiles.find_by_username("alice").await?;
//!     Ok(())
//! }
//! ```

pub mod mappers;
pub mod memory;
pub mod models;
pub mod pool;
pub mod realtime;
pub mod repositories;
pub mod storage;

// Re-export commonly used types
pub use memory::MemoryBackend;
pub use pool::{create_pool, run_migrations, PgPool};
pub use realtime::ChangeListener;
pub use repositories::{
    PgAuthProvider, PgChatroomRepository, PgDirectMessageRepository, PgMembershipRepository,
    PgMessageRepository, PgProfileRepository, PgRateLimitRepository,
};
pub use storage::LocalObjectStorage;
