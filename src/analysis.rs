//! ==============================================================================
//! analysis.rs - threshold breaches and daily statistics
//! ==============================================================================
//!
//! purpose:
//!     reads every stored reading for a device/project and derives:
//!     - the timestamps whose pm2.5 is strictly above the threshold
//!     - per-date max / min / avg / count
//!
//! nothing here is cached; each call recomputes from the store.
//! all aggregation is commutative so the store's row order does not matter,
//! and the daily map is a BTreeMap so the report iterates dates in order.
//!
//! ==============================================================================

use crate::domain::Reading;
use crate::store::{ReadingStore, StoreError};

use std::collections::BTreeMap;

/// default pm2.5 threshold in µg/m³
pub const DEFAULT_THRESHOLD: f64 = 30.0;

/// aggregate over all readings sharing a calendar date
#[derive(Clone, Debug, PartialEq)]
pub struct DailyStat {
    pub max: f64,
    pub min: f64,
    pub avg: f64,
    pub count: usize,
}

/// result of one analysis pass
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Analysis {
    /// timestamps of readings above the threshold, in query order
    pub above_threshold: Vec<String>,
    /// keyed by YYYY-MM-DD
    pub daily_stats: BTreeMap<String, DailyStat>,
}

// running totals for one date while folding
struct DayAccumulator {
    max: f64,
    min: f64,
    sum: f64,
    count: usize,
}

impl DayAccumulator {
    fn new(pm25: f64) -> Self {
        Self { max: pm25, min: pm25, sum: pm25, count: 1 }
    }

    fn add(&mut self, pm25: f64) {
        self.max = self.max.max(pm25);
        self.min = self.min.min(pm25);
        self.sum += pm25;
        self.count += 1;
    }

    // rounding in `sum` can push the mean one ulp past the extremes
    fn finish(self) -> DailyStat {
        DailyStat {
            avg: (self.sum / self.count as f64).clamp(self.min, self.max),
            max: self.max,
            min: self.min,
            count: self.count,
        }
    }
}

/// query the store for a device/project and summarise what it holds
pub fn analyse(
    store: &ReadingStore,
    device_id: &str,
    project_name: &str,
    threshold: f64,
) -> Result<Analysis, StoreError> {
    let readings = store.query_readings(device_id, project_name)?;
    tracing::debug!(device = device_id, rows = readings.len(), "Analysing stored readings");
    Ok(summarise(&readings, threshold))
}

/// single pass over readings: threshold breaches plus per-date stats
pub fn summarise(readings: &[Reading], threshold: f64) -> Analysis {
    let above_threshold = readings
        .iter()
        .filter(|r| r.pm25 > threshold)
        .map(|r| r.timestamp.clone())
        .collect();

    let mut days: BTreeMap<String, DayAccumulator> = BTreeMap::new();
    for r in readings {
        match days.get_mut(r.date()) {
            Some(acc) => acc.add(r.pm25),
            None => {
                days.insert(r.date().to_string(), DayAccumulator::new(r.pm25));
            }
        }
    }

    let daily_stats = days
        .into_iter()
        .map(|(date, acc)| (date, acc.finish()))
        .collect();

    Analysis { above_threshold, daily_stats }
}
