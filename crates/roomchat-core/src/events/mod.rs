//! Realtime change events

mod change_event;

pub use change_event::{ChangeEvent, ChangeFilter, ChangeType, Subscription, Table};
