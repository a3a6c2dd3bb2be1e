//! Structured logging setup

use tracing_subscriber::EnvFilter;

use crate::config::Config;

/// Install the global JSON subscriber
///
/// `service.log_level` is read as an `EnvFilter` directive; an unparsable
/// value falls back to `info`. Calling this twice keeps the first
/// subscriber.
pub fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_new(&config.service.log_level).unwrap_or_else(|_| EnvFilter::new("info"));

    let installed = tracing_subscriber::fmt()
        .json()
        .with_env_filter(filter)
        .try_init()
        .is_ok();

    if installed {
        tracing::info!(
            service = %config.service.name,
            environment = %config.service.environment,
            "Tracing initialized"
        );
    }
}
