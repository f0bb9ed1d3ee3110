//! Value objects - immutable types that represent domain concepts

mod change_kinds;
mod role;
mod snowflake;

pub use change_kinds::ChangeKinds;
pub use role::{Role, UnknownRole};
pub use snowflake::{Snowflake, SnowflakeGenerator, SnowflakeParseError};
