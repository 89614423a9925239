//! ==============================================================================
//! pipeline.rs - one fetch -> parse -> store -> analyse -> report run
//! ==============================================================================
//!
//! purpose:
//!     sequences the components for a single device/project and is the one
//!     place that decides whether a run stops early. nothing below this
//!     module recovers from errors; nothing here panics or exits the process.
//!
//! flow:
//!
//!     fetch_history ──NoRecords──────────────▶ info, stop (no store writes)
//!          │        ──ApiError───────────────▶ error, stop
//!          ▼
//!        parse ─▶ ensure_schema ─▶ insert ─▶ analyse ─▶ report
//!                        └──────StoreError────────┘──▶ error, stop
//!
//! relationships:
//!     - used by: main.rs
//!     - uses: client.rs, parser.rs, store.rs, analysis.rs, report.rs
//!
//! ==============================================================================

use crate::analysis::{self, Analysis};
use crate::client::{ApiError, FeedSource, HistoryOutcome};
use crate::domain::{RawFeed, Reading};
use crate::parser;
use crate::report::{self, ReportSink};
use crate::store::{ReadingStore, StoreError};

use tracing::debug;

/// the device and project a run is about
#[derive(Clone, Debug, PartialEq)]
pub struct Target {
    pub device_id: String,
    pub project_name: String,
}

/// how a run ended
#[derive(Debug)]
pub enum RunOutcome {
    /// pipeline completed and the report was written
    Reported(Analysis),
    /// api reported zero records for the device
    NoRecords,
    /// history could not be fetched
    FetchFailed(ApiError),
    /// local store could not be written or read
    StoreFailed(StoreError),
}

/// run the full pipeline once for `target`
pub async fn run_report<F, S>(
    source: &F,
    store: &mut ReadingStore,
    sink: &mut S,
    target: &Target,
    threshold: f64,
) -> RunOutcome
where
    F: FeedSource,
    S: ReportSink,
{
    let raw = match source.fetch_history(&target.device_id).await {
        Ok(HistoryOutcome::Records(raw)) => raw,
        Ok(HistoryOutcome::NoRecords) => {
            sink.info(&format!("Zero Records in history for device id: {}", target.device_id));
            return RunOutcome::NoRecords;
        }
        Err(e) => {
            sink.error(&format!("Failed to fetch history: {}", e));
            return RunOutcome::FetchFailed(e);
        }
    };

    match ingest_and_analyse(store, &raw, target, threshold) {
        Ok(analysis) => {
            report::report(sink, threshold, &analysis);
            RunOutcome::Reported(analysis)
        }
        Err(e) => {
            sink.error(&format!("Local store failed: {}", e));
            RunOutcome::StoreFailed(e)
        }
    }
}

// parse, persist, then analyse what the store now holds
fn ingest_and_analyse(
    store: &mut ReadingStore,
    raw: &RawFeed,
    target: &Target,
    threshold: f64,
) -> Result<Analysis, StoreError> {
    let readings: Vec<Reading> = parser::parse(raw, &target.project_name)
        .into_iter()
        .map(|(timestamp, pm25)| Reading::new(timestamp, pm25, &target.device_id, &target.project_name))
        .collect();
    debug!(parsed = readings.len(), "Parsed history");

    store.ensure_schema()?;
    store.insert_readings(&readings)?;

    analysis::analyse(store, &target.device_id, &target.project_name, threshold)
}

/// devices in `project_name` that have reported recently
pub async fn discover_devices<F: FeedSource>(source: &F, project_name: &str) -> Result<Vec<String>, ApiError> {
    source.fetch_latest_devices(project_name).await
}
