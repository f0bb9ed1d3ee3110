//! # roomchat-common
//!
//! Shared utilities including configuration, error handling, authentication, and telemetry.

pub mod auth;
pub mod config;
pub mod error;
pub mod telemetry;

// Re-export commonly used types at crate root
pub use auth::{
    generate_refresh_token, hash_password, hash_refresh_token, validate_password_strength,
    verify_password, verify_password_or_reject, Claims, IssuedToken, JwtService,
};
pub use config::{
    AppConfig, AppSettings, ConfigError, DatabaseConfig, Environment, ImageSearchConfig,
    JwtConfig, PushConfig, RateLimitConfig, RealtimeConfig, RedisConfig, StorageConfig,
};
pub use error::{describe_backend_code, AppError, AppResult, ErrorReport, GENERIC_ERROR_MESSAGE};
pub use telemetry::{try_init_tracing, try_init_tracing_with_config, TracingConfig, TracingError};
