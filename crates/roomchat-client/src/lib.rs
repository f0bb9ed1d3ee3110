//! # roomchat-client
//!
//! Client core for regional chatrooms and direct messages.
//!
//! Services borrow a [`ServiceContext`] holding the backend ports; screens
//! call services inside a [`RequestScope`] and keep realtime-updated lists
//! in a [`Feed`].
//!
//! ```ignore
//! let ctx = roomchat_client::connect(&AppConfig::from_env()?).await?;
//! let scope = RequestScope::new();
//!
//! let me = ctx.session().user_id()?;
//! ChatroomService::new(&ctx).verify_or_join(room_id, me).await?;
//! let page = scope.run(MessageService::new(&ctx).list_messages(room_id, None)).await?;
//! let mut feed = Feed::from_page(page.items);
//! ```

pub mod bootstrap;
pub mod dto;
pub mod feed;
pub mod http;
pub mod scope;
pub mod services;
pub mod session;

pub use bootstrap::connect;
pub use feed::{Feed, FeedChange, FeedItem};
pub use scope::RequestScope;
pub use services::{ServiceContext, ServiceError, ServiceResult};
pub use session::SessionStore;
