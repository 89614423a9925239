//! ==============================================================================
//! logging.rs - tracing subscriber setup
//! ==============================================================================
//!
//! purpose:
//!     routes tracing records to stdout and, when configured, appends them to
//!     a log file. RUST_LOG overrides the configured level.
//!
//! relationships:
//!     - used by: main.rs (once, before the first run)
//!     - reads: config.rs (LoggingConfig)
//!
//! ==============================================================================

use crate::config::LoggingConfig;

use anyhow::{Context, Result};
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub fn init(config: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .with_context(|| format!("Invalid log level '{}'", config.level))?;

    let file_layer = match log_file(config) {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            Some(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .with(file_layer)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    Ok(())
}

// configured file path, unless blank
fn log_file(config: &LoggingConfig) -> Option<&Path> {
    config
        .file
        .as_deref()
        .filter(|p| !p.as_os_str().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_blank_file_disables_file_logging() {
        let config = LoggingConfig { level: "info".into(), file: Some(PathBuf::new()) };
        assert!(log_file(&config).is_none());

        let config = LoggingConfig { level: "info".into(), file: None };
        assert!(log_file(&config).is_none());

        let config = LoggingConfig::default();
        assert_eq!(log_file(&config), Some(Path::new("app.log")));
    }
}
