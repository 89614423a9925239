//! ==============================================================================
//! config.rs - Runtime Configuration Loader
//! ==============================================================================
//!
//! purpose:
//!     defines the schema for `report.toml`.
//!     loads configuration from file or falls back to defaults.
//!
//! structure:
//!     - ApiConfig: Base url of the pm2.5 api and request timeout.
//!     - StorageConfig: Where the sqlite database lives.
//!     - AnalysisConfig: The pm2.5 threshold.
//!     - LoggingConfig: Log level and optional log file.
//!     - DefaultsConfig: Device/project used when none is given on the command line.
//!
//! ==============================================================================

use crate::analysis::DEFAULT_THRESHOLD;

use anyhow::Context;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// env var pointing at an explicit config file
pub const CONFIG_ENV: &str = "PM25_REPORT_CONFIG";

/// Root configuration structure
#[derive(Debug, Deserialize, Clone, Default)]
pub struct ReportConfig {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub defaults: DefaultsConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout_seconds: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://pm25.lass-net.org/API-1.0.0".to_string(),
            timeout_seconds: 30,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StorageConfig {
    pub db_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self { db_path: PathBuf::from("pm25_data.db") }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct AnalysisConfig {
    /// pm2.5 level (µg/m³) above which a reading is flagged
    pub threshold: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self { threshold: DEFAULT_THRESHOLD }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// appended to in addition to stdout; an empty path disables the file
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), file: Some(PathBuf::from("app.log")) }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DefaultsConfig {
    pub device_id: String,
    pub project_name: String,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self { device_id: "08BEAC0AB11E".to_string(), project_name: "AirBox".to_string() }
    }
}

impl ReportConfig {
    /// Load configuration from file
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file {}", path.as_ref().display()))?;

        let config: ReportConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config {}", path.as_ref().display()))?;

        Ok(config)
    }

    /// Load with default fallback
    ///
    /// runs before logging is initialised, so problems go to stderr.
    pub fn load_or_default() -> Self {
        let mut paths = Vec::new();
        if let Ok(explicit) = std::env::var(CONFIG_ENV) {
            paths.push(PathBuf::from(explicit));
        }
        paths.push(PathBuf::from("config").join("report.toml"));
        paths.push(PathBuf::from("..").join("config").join("report.toml"));

        for path in &paths {
            if path.exists() {
                match Self::load(path) {
                    Ok(config) => return config,
                    Err(e) => eprintln!("[CONFIG] Warning: {:#}", e),
                }
            }
        }

        Self::default()
    }

    /// Log configuration summary
    pub fn log_summary(&self) {
        tracing::info!(
            api = %self.api.base_url,
            db = %self.storage.db_path.display(),
            threshold = self.analysis.threshold,
            log_level = %self.logging.level,
            "Configuration loaded"
        );
    }
}
