//! Application configuration structs
//!
//! Loads configuration from environment variables (after reading `.env`).

use serde::Deserialize;
use std::env;
use std::str::FromStr;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub app: AppSettings,
    pub database: DatabaseConfig,
    pub redis: RedisConfig,
    pub jwt: JwtConfig,
    pub rate_limit: RateLimitConfig,
    pub storage: StorageConfig,
    pub push: PushConfig,
    pub images: ImageSearchConfig,
    pub realtime: RealtimeConfig,
}

/// General application settings
#[derive(Debug, Clone, Deserialize)]
pub struct AppSettings {
    #[serde(default = "default_app_name")]
    pub name: String,
    #[serde(default = "default_env")]
    pub env: Environment,
}

/// Environment type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    #[must_use]
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    #[must_use]
    pub fn is_development(&self) -> bool {
        matches!(self, Self::Development)
    }

    fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "production" => Some(Self::Production),
            "staging" => Some(Self::Staging),
            "development" => Some(Self::Development),
            _ => None,
        }
    }
}

/// Database configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    /// Apply pending migrations when connecting
    #[serde(default)]
    pub run_migrations: bool,
}

/// Redis configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RedisConfig {
    pub url: String,
    #[serde(default = "default_redis_max_connections")]
    pub max_connections: u32,
}

/// Session token configuration
#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    /// Seconds
    #[serde(default = "default_access_token_expiry")]
    pub access_token_expiry: i64,
    /// Seconds
    #[serde(default = "default_refresh_token_expiry")]
    pub refresh_token_expiry: i64,
}

/// Message send quota
#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    #[serde(default = "default_messages_per_window")]
    pub messages_per_window: u32,
    #[serde(default = "default_window_seconds")]
    pub window_seconds: i64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            messages_per_window: default_messages_per_window(),
            window_seconds: default_window_seconds(),
        }
    }
}

/// Object storage configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_upload_dir")]
    pub upload_dir: String,
    /// Prefix for public object URLs: `{public_base_url}/{bucket}/{path}`
    #[serde(default = "default_public_base_url")]
    pub public_base_url: String,
    #[serde(default = "default_max_file_size_bytes")]
    pub max_file_size_bytes: usize,
}

/// Push notification relay
#[derive(Debug, Clone, Deserialize)]
pub struct PushConfig {
    #[serde(default = "default_push_relay_url")]
    pub relay_url: String,
    #[serde(default = "default_http_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for PushConfig {
    fn default() -> Self {
        Self {
            relay_url: default_push_relay_url(),
            timeout_secs: default_http_timeout_secs(),
        }
    }
}

/// Background image search
#[derive(Debug, Clone, Deserialize)]
pub struct ImageSearchConfig {
    #[serde(default = "default_image_api_url")]
    pub api_url: String,
    /// Without a key the fallback list is served
    #[serde(default)]
    pub access_key: Option<String>,
    #[serde(default = "default_http_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ImageSearchConfig {
    fn default() -> Self {
        Self {
            api_url: default_image_api_url(),
            access_key: None,
            timeout_secs: default_http_timeout_secs(),
        }
    }
}

/// Change feed plumbing
#[derive(Debug, Clone, Deserialize)]
pub struct RealtimeConfig {
    /// Postgres NOTIFY channel the row triggers write to
    #[serde(default = "default_notify_channel")]
    pub notify_channel: String,
    /// Capacity of the in-process broadcast buffer per table
    #[serde(default = "default_realtime_buffer")]
    pub buffer: usize,
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            notify_channel: default_notify_channel(),
            buffer: default_realtime_buffer(),
        }
    }
}

// Default value functions
fn default_app_name() -> String {
    "roomchat".to_string()
}

fn default_env() -> Environment {
    Environment::Development
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

fn default_redis_max_connections() -> u32 {
    10
}

fn default_access_token_expiry() -> i64 {
    3600 // 1 hour
}

fn default_refresh_token_expiry() -> i64 {
    2_592_000 // 30 days
}

fn default_messages_per_window() -> u32 {
    30
}

fn default_window_seconds() -> i64 {
    60
}

fn default_upload_dir() -> String {
    "./storage".to_string()
}

fn default_public_base_url() -> String {
    "http://localhost:8080/storage/v1/object/public".to_string()
}

fn default_max_file_size_bytes() -> usize {
    5 * 1024 * 1024
}

fn default_push_relay_url() -> String {
    "https://exp.host/--/api/v2/push/send".to_string()
}

fn default_image_api_url() -> String {
    "https://api.unsplash.com/search/photos".to_string()
}

fn default_http_timeout_secs() -> u64 {
    10
}

fn default_notify_channel() -> String {
    "roomchat_changes".to_string()
}

fn default_realtime_buffer() -> usize {
    1024
}

/// Parse an optional variable, falling back to `default` when unset
fn parse_var<T: FromStr>(key: &'static str, default: impl FnOnce() -> T) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue(key, raw)),
        Err(_) => Ok(default()),
    }
}

fn required_var(key: &'static str) -> Result<String, ConfigError> {
    env::var(key).map_err(|_| ConfigError::MissingVar(key))
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    /// Returns an error if required environment variables are missing or
    /// a value does not parse
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Ok(Self {
            app: AppSettings {
                name: env::var("APP_NAME").unwrap_or_else(|_| default_app_name()),
                env: env::var("APP_ENV")
                    .ok()
                    .and_then(|s| Environment::parse(&s))
                    .unwrap_or_default(),
            },
            database: DatabaseConfig {
                url: required_var("DATABASE_URL")?,
                max_connections: parse_var("DATABASE_MAX_CONNECTIONS", default_max_connections)?,
                min_connections: parse_var("DATABASE_MIN_CONNECTIONS", default_min_connections)?,
                run_migrations: parse_var("DATABASE_RUN_MIGRATIONS", || false)?,
            },
            redis: RedisConfig {
                url: required_var("REDIS_URL")?,
                max_connections: parse_var("REDIS_MAX_CONNECTIONS", default_redis_max_connections)?,
            },
            jwt: JwtConfig {
                secret: required_var("JWT_SECRET")?,
                access_token_expiry: parse_var("JWT_ACCESS_TOKEN_EXPIRY", default_access_token_expiry)?,
                refresh_token_expiry: parse_var(
                    "JWT_REFRESH_TOKEN_EXPIRY",
                    default_refresh_token_expiry,
                )?,
            },
            rate_limit: RateLimitConfig {
                messages_per_window: parse_var(
                    "RATE_LIMIT_MESSAGES_PER_WINDOW",
                    default_messages_per_window,
                )?,
                window_seconds: parse_var("RATE_LIMIT_WINDOW_SECONDS", default_window_seconds)?,
            },
            storage: StorageConfig {
                upload_dir: env::var("UPLOAD_DIR").unwrap_or_else(|_| default_upload_dir()),
                public_base_url: env::var("STORAGE_PUBLIC_URL")
                    .unwrap_or_else(|_| default_public_base_url()),
                max_file_size_bytes: parse_var("MAX_FILE_SIZE_BYTES", default_max_file_size_bytes)?,
            },
            push: PushConfig {
                relay_url: env::var("PUSH_RELAY_URL").unwrap_or_else(|_| default_push_relay_url()),
                timeout_secs: parse_var("PUSH_TIMEOUT_SECS", default_http_timeout_secs)?,
            },
            images: ImageSearchConfig {
                api_url: env::var("IMAGE_API_URL").unwrap_or_else(|_| default_image_api_url()),
                access_key: env::var("IMAGE_API_KEY").ok().filter(|k| !k.trim().is_empty()),
                timeout_secs: parse_var("IMAGE_API_TIMEOUT_SECS", default_http_timeout_secs)?,
            },
            realtime: RealtimeConfig {
                notify_channel: env::var("REALTIME_NOTIFY_CHANNEL")
                    .unwrap_or_else(|_| default_notify_channel()),
                buffer: parse_var("REALTIME_BUFFER", default_realtime_buffer)?,
            },
        })
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(&'static str),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(&'static str, String),
}
