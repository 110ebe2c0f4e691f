//! Initialization functions for tracing
//!
//! Installs a `tracing-subscriber` formatter whose filter comes from
//! `RUST_LOG` when set, falling back to the configured level.

use anyhow::{Result, anyhow};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::LoggingConfig;

/// Initialize tracing with the given configuration
pub fn init_tracing(config: &LoggingConfig) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(env_filter);

    let result = if config.json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_target(true))
            .try_init()
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_target(true))
            .try_init()
    };

    result.map_err(|e| anyhow!("failed to install tracing subscriber: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_init_reports_error_instead_of_panicking() {
        let config = LoggingConfig::default();
        let first = init_tracing(&config);
        let second = init_tracing(&config);
        // The first call fails too if another test installed a subscriber.
        if let Err(err) = first {
            assert!(err.to_string().starts_with("failed to install tracing subscriber"));
        }
        let err = second.unwrap_err();
        assert!(err.to_string().starts_with("failed to install tracing subscriber"));
    }
}
