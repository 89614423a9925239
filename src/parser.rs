//! ==============================================================================
//! parser.rs - history payload to (timestamp, pm25) pairs
//! ==============================================================================
//!
//! purpose:
//!     walks the raw history json and pulls out every pm2.5 value (`s_d0`)
//!     recorded under the requested project.
//!
//! payload shape:
//!
//!     {
//!       "num_of_records": 1,
//!       "feeds": [
//!         { "AirBox": [ { "2024-05-23T11:32:17Z": { "s_d0": 12.5, ... } } ] }
//!       ]
//!     }
//!
//! rules:
//!     - only the exact (case-sensitive) project key is read
//!     - records without a numeric `s_d0` are skipped
//!     - any structure that does not match degrades to "nothing extracted"
//!     - output keeps payload order: feed, then record, then timestamp key
//!
//! relationships:
//!     - used by: pipeline.rs (between fetch and store)
//!     - reads: domain.rs (RawFeed)
//!
//! ==============================================================================

use crate::domain::RawFeed;
use serde_json::Value;

/// field carrying the pm2.5 value inside each timestamped record
const PM25_FIELD: &str = "s_d0";

/// extract (timestamp, pm25) pairs for `project_name` from a history payload
///
/// pure and total: never fails, unknown shapes just yield fewer pairs.
pub fn parse(raw: &RawFeed, project_name: &str) -> Vec<(String, f64)> {
    let feeds = raw.0.get("feeds").and_then(Value::as_array);

    feeds
        .into_iter()
        .flatten()
        .filter_map(|feed| feed.get(project_name).and_then(Value::as_array))
        .flatten()
        .filter_map(Value::as_object)
        .flat_map(|record| record.iter())
        .filter_map(|(timestamp, values)| {
            values
                .get(PM25_FIELD)
                .and_then(Value::as_f64)
                .map(|pm25| (timestamp.clone(), pm25))
        })
        .collect()
}
