//! ==============================================================================
//! main.rs - pm2.5 report entry point
//! ==============================================================================
//!
//! purpose:
//!     fetches the pm2.5 history of one sensor device, stores it in a local
//!     sqlite database, and logs which readings crossed the threshold plus
//!     per-day statistics. one invocation = one run for one device.
//!
//! usage:
//!     pm25-report [DEVICE_ID] [PROJECT_NAME]
//!     pm25-report --list-devices [PROJECT_NAME]
//!
//! relationships:
//!     - uses: config.rs (report.toml), logging.rs (subscriber setup)
//!     - uses: pipeline.rs (the run itself), client.rs (http api)
//!
//! architecture:
//!
//!     ┌──────────┐   ┌──────────┐   ┌──────────┐   ┌──────────┐   ┌──────────┐
//!     │ client   │──▶│ parser   │──▶│ store    │──▶│ analysis │──▶│ report   │
//!     │ (http)   │   │ (json)   │   │ (sqlite) │   │ (stats)  │   │ (sink)   │
//!     └──────────┘   └──────────┘   └──────────┘   └──────────┘   └──────────┘
//!           └──────────────── sequenced by pipeline.rs ───────────────┘
//!
//! ==============================================================================

mod analysis;
mod client;
mod config;
mod domain;
mod logging;
mod parser;
mod pipeline;
mod report;
mod store;

use anyhow::{Context, Result};
use clap::Parser;
use client::PmApiClient;
use config::{DefaultsConfig, ReportConfig};
use pipeline::{RunOutcome, Target};
use report::TracingSink;
use store::ReadingStore;

#[derive(Parser, Debug)]
#[command(name = "pm25-report")]
#[command(about = "Fetch PM2.5 history for a device, store it and report threshold breaches", long_about = None)]
struct Cli {
    /// Sensor device id (defaults to [defaults] device_id)
    device_id: Option<String>,

    /// Project the device reports under (defaults to [defaults] project_name)
    project_name: Option<String>,

    /// List recently active devices of a project instead of reporting
    #[arg(long, value_name = "PROJECT_NAME", conflicts_with_all = ["device_id", "project_name"])]
    list_devices: Option<Option<String>>,
}

/// what the command line asked for
#[derive(Debug, PartialEq)]
enum Command {
    Report(Target),
    ListDevices { project_name: String },
}

impl Cli {
    /// resolve missing arguments against the configured defaults
    fn into_command(self, defaults: &DefaultsConfig) -> Command {
        match self.list_devices {
            Some(project) => Command::ListDevices {
                project_name: project.unwrap_or_else(|| defaults.project_name.clone()),
            },
            None => Command::Report(Target {
                device_id: self.device_id.unwrap_or_else(|| defaults.device_id.clone()),
                project_name: self.project_name.unwrap_or_else(|| defaults.project_name.clone()),
            }),
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // step 1: read the command line (clap exits on --help or bad flags), then configuration
    let cli = Cli::parse();
    let config = ReportConfig::load_or_default();
    let command = cli.into_command(&config.defaults);

    // step 2: logging
    logging::init(&config.logging)?;
    config.log_summary();

    let client = PmApiClient::new(&config.api).context("Failed to build http client")?;

    match command {
        Command::ListDevices { project_name } => {
            match pipeline::discover_devices(&client, &project_name).await {
                Ok(devices) => tracing::info!(
                    project = %project_name,
                    count = devices.len(),
                    "Active devices: {:?}",
                    devices
                ),
                Err(e) => tracing::error!(project = %project_name, "Failed to list devices: {}", e),
            }
        }
        Command::Report(target) => {
            // step 3: one fetch -> store -> report run
            let mut store = ReadingStore::open(&config.storage.db_path)
                .with_context(|| format!("Failed to open {}", config.storage.db_path.display()))?;
            let mut sink = TracingSink::new(&target.device_id);

            let outcome = pipeline::run_report(
                &client,
                &mut store,
                &mut sink,
                &target,
                config.analysis.threshold,
            )
            .await;

            match outcome {
                RunOutcome::Reported(analysis) => tracing::debug!(
                    breaches = analysis.above_threshold.len(),
                    days = analysis.daily_stats.len(),
                    "Run complete"
                ),
                RunOutcome::NoRecords => tracing::debug!("Run ended: no records"),
                RunOutcome::FetchFailed(e) => tracing::debug!(error = ?e, "Run ended: fetch failed"),
                RunOutcome::StoreFailed(e) => tracing::debug!(error = ?e, "Run ended: store failed"),
            }
        }
    }

    Ok(())
}

// ==============================================================================
// tests
// ==============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;

    fn command(args: &[&str]) -> Command {
        let argv = std::iter::once("pm25-report").chain(args.iter().copied());
        Cli::try_parse_from(argv).unwrap().into_command(&DefaultsConfig::default())
    }

    fn parse_error(args: &[&str]) -> ErrorKind {
        let argv = std::iter::once("pm25-report").chain(args.iter().copied());
        Cli::try_parse_from(argv).unwrap_err().kind()
    }

    fn target(device: &str, project: &str) -> Command {
        Command::Report(Target { device_id: device.into(), project_name: project.into() })
    }

    #[test]
    fn test_defaults_when_no_args() {
        assert_eq!(command(&[]), target("08BEAC0AB11E", "AirBox"));
    }

    #[test]
    fn test_positional_args() {
        assert_eq!(command(&["74DA38F7C254"]), target("74DA38F7C254", "AirBox"));
        assert_eq!(command(&["74DA38F7C254", "LASS"]), target("74DA38F7C254", "LASS"));
    }

    #[test]
    fn test_list_devices() {
        assert_eq!(command(&["--list-devices"]), Command::ListDevices { project_name: "AirBox".into() });
        assert_eq!(
            command(&["--list-devices", "LASS"]),
            Command::ListDevices { project_name: "LASS".into() }
        );
    }

    #[test]
    fn test_mistyped_flag_is_rejected() {
        assert_eq!(parse_error(&["--list-device"]), ErrorKind::UnknownArgument);
        assert_eq!(parse_error(&["08BEAC0AB11E", "--bogus"]), ErrorKind::UnknownArgument);
    }

    #[test]
    fn test_help_after_positional_is_help() {
        assert_eq!(parse_error(&["08BEAC0AB11E", "--help"]), ErrorKind::DisplayHelp);
        assert_eq!(parse_error(&["-h"]), ErrorKind::DisplayHelp);
    }

    #[test]
    fn test_list_devices_conflicts_with_device() {
        assert_eq!(parse_error(&["08BEAC0AB11E", "--list-devices"]), ErrorKind::ArgumentConflict);
    }

    #[test]
    fn test_cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
