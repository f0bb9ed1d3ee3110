//! Integration test utilities for roomchat
//!
//! Scenarios run the client services against the in-memory backend, with
//! axum mock servers standing in for the push relay and image search.

pub mod fixtures;
pub mod helpers;

pub use fixtures::*;
pub use helpers::*;
