//! Logging setup
//!
//! Logs go to stderr so `--json` output on stdout stays machine readable.
//! `RUST_LOG`, when set, takes precedence over the configured level.

use std::fs::OpenOptions;
use std::sync::Arc;

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LoggingConfig;

/// Builds the filter directive for the configured level
pub fn filter_directive(config: &LoggingConfig, verbose: bool) -> String {
    let level = if verbose { "debug" } else { config.level.as_str() };
    format!("{},hyper=warn,reqwest=warn", level)
}

/// Installs the global subscriber
///
/// Fails only if the log file cannot be opened. A subscriber that is
/// already installed is left in place.
pub fn init(config: &LoggingConfig, verbose: bool) -> std::io::Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_directive(config, verbose)));

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);

    let file_layer = if config.log_to_file {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&config.file)?;
        Some(
            fmt::layer()
                .with_writer(Arc::new(file))
                .with_ansi(false),
        )
    } else {
        None
    };

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init();

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_uses_configured_level() {
        let config = LoggingConfig {
            level: "info".to_string(),
            ..Default::default()
        };
        assert_eq!(filter_directive(&config, false), "info,hyper=warn,reqwest=warn");
    }

    #[test]
    fn test_verbose_forces_debug() {
        let config = LoggingConfig::default();
        assert!(filter_directive(&config, true).starts_with("debug,"));
    }

    #[test]
    fn test_init_with_log_file_creates_file() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let config = LoggingConfig {
            log_to_file: true,
            file: temp_dir.path().join("stackx.log"),
            ..Default::default()
        };

        init(&config, false).unwrap();

        assert!(config.file.exists());
    }
}
