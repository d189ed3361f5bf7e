//! Global tracing subscriber setup.

use crate::config::LoggingConfig;
use anyhow::anyhow;
use tracing_subscriber::EnvFilter;

/// Install the global subscriber.
///
/// `RUST_LOG` takes precedence over the configured level. Fails if a
/// subscriber is already installed or the level is not a valid directive.
pub fn init(config: &LoggingConfig) -> anyhow::Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.level)
            .map_err(|e| anyhow!("Invalid log level {:?}: {e}", config.level))?,
    };

    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(true);

    let result = if config.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };

    result.map_err(|e| anyhow!("Failed to install tracing subscriber: {e}"))
}
