//! Tracing subscriber setup shared by docauth binaries

use crate::config::LoggingConfig;
use crate::{Error, Result};
use tracing_subscriber::EnvFilter;

/// Install the global fmt subscriber.
///
/// `RUST_LOG` takes precedence over the configured level so a single run can
/// be made verbose without editing the TOML file.
pub fn init_tracing(config: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .map_err(|e| Error::Config(format!("Invalid log level '{}': {}", config.level, e)))?;

    // Logs go to stderr so stdout stays clean for report output
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(config.show_targets)
        .try_init()
        .map_err(|e| Error::Internal(format!("Tracing already initialized: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_level_rejected() {
        let config = LoggingConfig {
            level: "docauth_ai=loud".to_string(),
            show_targets: false,
        };
        // An explicit RUST_LOG would mask the bad level; only assert when unset
        if std::env::var("RUST_LOG").is_err() {
            assert!(matches!(init_tracing(&config), Err(Error::Config(_))));
        }
    }
}
