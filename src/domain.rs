/// one pm2.5 sample for a device within a project
///
/// (timestamp, device_id, project_name) identifies a reading. once stored
/// it is never updated; re-ingesting the same key is ignored.
#[derive(Clone, Debug, PartialEq)]
pub struct Reading {
    /// iso-8601 timestamp as sent by the api (e.g. "2024-05-23T11:32:17Z")
    pub timestamp: String,

    /// pm2.5 concentration in µg/m³ (the feed's `s_d0` field)
    pub pm25: f64,

    /// sensor identifier (e.g. "08BEAC0AB11E")
    pub device_id: String,

    /// project the device reports under (e.g. "AirBox")
    pub project_name: String,
}

impl Reading {
    /// attach a parsed (timestamp, value) pair to its device and project
    pub fn new(timestamp: impl Into<String>, pm25: f64, device_id: &str, project_name: &str) -> Self {
        Self {
            timestamp: timestamp.into(),
            pm25,
            device_id: device_id.to_string(),
            project_name: project_name.to_string(),
        }
    }

    /// calendar date prefix (YYYY-MM-DD) used to group daily statistics
    ///
    /// the first 10 characters (not bytes), or the whole timestamp when it
    /// is shorter than that.
    pub fn date(&self) -> &str {
        match self.timestamp.char_indices().nth(10) {
            Some((end, _)) => &self.timestamp[..end],
            None => &self.timestamp,
        }
    }
}

/// raw history payload, kept as untyped json so parsing can degrade
/// gracefully on unexpected structure
#[derive(Clone, Debug, PartialEq)]
pub struct RawFeed(pub serde_json::Value);
