//! Presence agent entry point
//!
//! Run with:
//! ```bash
//! cargo run -p presence-agent
//! ```
//!
//! Configuration is loaded from environment variables.

use presence_common::{try_init_tracing_with_config, AppConfig, AppError, TracingConfig};
use tracing::{error, info};

#[tokio::main]
async fn main() {
    let config = AppConfig::from_env();

    // Initialize tracing (pretty in development, JSON in production)
    let tracing_config = config.as_ref().map_or_else(
        |_| TracingConfig::default(),
        |config| TracingConfig::for_environment(config.app.env),
    );
    if let Err(e) = try_init_tracing_with_config(tracing_config) {
        eprintln!("Warning: Failed to initialize tracing: {e}");
    }

    let result = match config {
        Ok(config) => run(config).await,
        Err(e) => {
            error!(error = %e, "Failed to load configuration");
            Err(AppError::from(e))
        }
    };

    if let Err(e) = result {
        error!(error = %e, code = e.error_code(), "Presence agent failed");
        std::process::exit(e.exit_code());
    }
}

async fn run(config: AppConfig) -> Result<(), AppError> {
    info!(
        app = %config.app.name,
        env = ?config.app.env,
        debounce_ms = config.presence.activity_debounce_ms,
        threshold_minutes = config.presence.offline_threshold_minutes,
        poll_ms = config.presence.status_check_interval_ms,
        "Starting presence agent..."
    );

    presence_agent::run(config).await
}
