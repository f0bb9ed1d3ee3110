//! Configuration structs

mod app_config;

pub use app_config::{
    AppConfig, AppSettings, ConfigError, DatabaseConfig, Environment, ImageSearchConfig,
    JwtConfig, PushConfig, RateLimitConfig, RealtimeConfig, RedisConfig, StorageConfig,
};
