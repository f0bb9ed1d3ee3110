//! Database-originated change feed

mod listener;

pub use listener::ChangeListener;
