//! Data transfer objects for service inputs and outputs
//!
//! This module provides:
//! - Request DTOs with validation
//! - Response DTOs
//! - Mappers that join rows with the profiles they reference

pub mod mappers;
pub mod requests;
pub mod responses;

pub use requests::{
    ImageUpload, SendDirectMessageRequest, SendMessageRequest, SignInRequest, SignUpRequest,
    UpdateProfileRequest,
};
pub use responses::{AuthResponse, MemberResponse, MessagePage};
