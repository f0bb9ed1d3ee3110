//! Model to entity mappers
//!
//! `From<Model> for Entity` conversions for rows read back from PostgreSQL.

mod chatroom;
mod direct_message;
mod message;
mod profile;
mod rate_limit;

pub use direct_message::summary_from_model;
pub use rate_limit::counter_from_model;
