//! ==============================================================================
//! report.rs - operator-facing report output
//! ==============================================================================
//!
//! purpose:
//!     renders an analysis as log lines through a ReportSink. the sink is
//!     built per run (one per device) and handed in, so nothing here touches
//!     global logging state directly.
//!
//! relationships:
//!     - used by: pipeline.rs (report + run status messages), main.rs
//!     - reads: analysis.rs (Analysis)
//!
//! ==============================================================================

use crate::analysis::Analysis;

/// destination for operator-visible lines
pub trait ReportSink {
    fn info(&mut self, message: &str);
    fn error(&mut self, message: &str);
}

/// sink that emits through `tracing`, tagged with the device being reported
pub struct TracingSink {
    device_id: String,
}

impl TracingSink {
    pub fn new(device_id: &str) -> Self {
        Self { device_id: device_id.to_string() }
    }
}

impl ReportSink for TracingSink {
    fn info(&mut self, message: &str) {
        tracing::info!(device = %self.device_id, "{}", message);
    }

    fn error(&mut self, message: &str) {
        tracing::error!(device = %self.device_id, "{}", message);
    }
}

/// write the threshold line, then one line per date
pub fn report<S: ReportSink>(sink: &mut S, threshold: f64, analysis: &Analysis) {
    sink.info(&format!(
        "Periods where PM2.5 level went above the threshold of {}: {:?}",
        threshold, analysis.above_threshold
    ));

    sink.info("Daily PM2.5 statistics:");
    for (date, stats) in &analysis.daily_stats {
        sink.info(&format!(
            "Date: {}, Max: {}, Min: {}, Avg: {}, Readings: {}",
            date, stats.max, stats.min, stats.avg, stats.count
        ));
    }
}

/// sink that keeps lines in memory, for tests
#[cfg(test)]
#[derive(Default)]
pub struct MemorySink {
    pub infos: Vec<String>,
    pub errors: Vec<String>,
}

#[cfg(test)]
impl ReportSink for MemorySink {
    fn info(&mut self, message: &str) {
        self.infos.push(message.to_string());
    }

    fn error(&mut self, message: &str) {
        self.errors.push(message.to_string());
    }
}

// ==============================================================================
// tests
// ==============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{summarise, DEFAULT_THRESHOLD};
    use crate::domain::Reading;

    #[test]
    fn test_report_lines() {
        let readings = vec![
            Reading::new("2024-05-24T12:00:00Z", 35.0, "dev", "AirBox"),
            Reading::new("2024-05-23T00:00:00Z", 10.0, "dev", "AirBox"),
            Reading::new("2024-05-23T12:00:00Z", 40.0, "dev", "AirBox"),
        ];
        let analysis = summarise(&readings, DEFAULT_THRESHOLD);

        let mut sink = MemorySink::default();
        report(&mut sink, DEFAULT_THRESHOLD, &analysis);

        assert_eq!(
            sink.infos,
            vec![
                r#"Periods where PM2.5 level went above the threshold of 30: ["2024-05-24T12:00:00Z", "2024-05-23T12:00:00Z"]"#,
                "Daily PM2.5 statistics:",
                "Date: 2024-05-23, Max: 40, Min: 10, Avg: 25, Readings: 2",
                "Date: 2024-05-24, Max: 35, Min: 35, Avg: 35, Readings: 1",
            ]
        );
        assert!(sink.errors.is_empty());
    }

    #[test]
    fn test_daily_line_uses_one_precision() {
        let readings = vec![
            Reading::new("2024-05-23T00:00:00Z", 10.5, "dev", "AirBox"),
            Reading::new("2024-05-23T01:00:00Z", 11.0, "dev", "AirBox"),
            Reading::new("2024-05-23T02:00:00Z", 12.25, "dev", "AirBox"),
        ];
        let analysis = summarise(&readings, DEFAULT_THRESHOLD);

        let mut sink = MemorySink::default();
        report(&mut sink, DEFAULT_THRESHOLD, &analysis);

        assert_eq!(sink.infos[2], "Date: 2024-05-23, Max: 12.25, Min: 10.5, Avg: 11.25, Readings: 3");
    }

    #[test]
    fn test_report_empty_analysis() {
        let mut sink = MemorySink::default();
        report(&mut sink, DEFAULT_THRESHOLD, &Analysis::default());

        assert_eq!(sink.infos.len(), 2);
        assert!(sink.infos[0].ends_with("[]"));
    }
}
