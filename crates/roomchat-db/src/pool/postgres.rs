//! PostgreSQL connection pool management

use roomchat_common::DatabaseConfig;
use sqlx::migrate::Migrator;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::path::Path;
use std::time::Duration;
use tracing::info;

const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(10);
const IDLE_TIMEOUT: Duration = Duration::from_secs(300);
const MAX_LIFETIME: Duration = Duration::from_secs(1800);

/// Pool options derived from the database section of the app config
pub fn pool_options(config: &DatabaseConfig) -> PgPoolOptions {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections.min(config.max_connections))
        .acquire_timeout(ACQUIRE_TIMEOUT)
        .idle_timeout(IDLE_TIMEOUT)
        .max_lifetime(MAX_LIFETIME)
}

/// Create a new PostgreSQL connection pool
///
/// Applies pending migrations first when `run_migrations` is set.
pub async fn create_pool(config: &DatabaseConfig) -> Result<PgPool, sqlx::Error> {
    let pool = pool_options(config).connect(&config.url).await?;

    if config.run_migrations {
        run_migrations(&pool).await?;
    }

    Ok(pool)
}

/// Apply the schema migrations shipped with this crate
///
/// Read from disk at runtime; sqlx's `macros` feature is off.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::Error> {
    let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("migrations");
    Migrator::new(dir).await?.run(pool).await?;
    info!("database migrations applied");
    Ok(())
}
