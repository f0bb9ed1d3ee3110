//! Change relay entry point
//!
//! Run with:
//! ```bash
//! cargo run -p roomchat-cache --bin roomchat-relay
//! ```
//!
//! Configuration is loaded from environment variables.

use roomchat_common::{try_init_tracing, try_init_tracing_with_config, AppConfig, TracingConfig};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            let _ = try_init_tracing();
            error!(error = %e, "Failed to load configuration");
            std::process::exit(1);
        }
    };

    if let Err(e) = try_init_tracing_with_config(TracingConfig::for_environment(config.app.env)) {
        eprintln!("Warning: Failed to initialize tracing: {e}");
    }

    if let Err(e) = run(config).await {
        error!(error = %e, "Relay failed");
        std::process::exit(1);
    }
}

async fn run(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    info!(env = ?config.app.env, "Starting change relay...");

    let shutdown = CancellationToken::new();
    let signal = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Shutdown signal received");
        }
        signal.cancel();
    });

    roomchat_cache::relay::run(config, shutdown).await?;

    Ok(())
}
