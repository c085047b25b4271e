//! Structured logging initialization

use tracing_subscriber::{fmt, EnvFilter};

use crate::config::LoggingConfig;

/// Initialize the global tracing subscriber.
///
/// `RUST_LOG` overrides the configured level when set.
pub fn init_tracing(
    config: &LoggingConfig,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let filter =
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&config.level))?;

    match config.format.as_str() {
        "pretty" => fmt().with_env_filter(filter).pretty().try_init()?,
        _ => fmt().with_env_filter(filter).json().try_init()?,
    }

    Ok(())
}
