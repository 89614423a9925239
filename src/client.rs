//! ==============================================================================
//! client.rs - pm2.5 api client
//! ==============================================================================
//!
//! purpose:
//!     fetches raw device history and the list of recently active devices
//!     for a project from the pm2.5 http api.
//!
//! endpoints:
//!     GET {base}/device/{device_id}/history/      -> num_of_records + feeds
//!     GET {base}/project/{project_lower}/latest/  -> feeds: [{device_id}]
//!
//! "zero records" is not an error here: fetch_history returns
//! HistoryOutcome::NoRecords and leaves the decision to the orchestrator.
//!
//! relationships:
//!     - used by: pipeline.rs (through the FeedSource trait), main.rs
//!     - reads: config.rs (ApiConfig)
//!
//! ==============================================================================

use crate::config::ApiConfig;
use crate::domain::RawFeed;

use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, instrument};

/// failures talking to the api
#[derive(Debug, Error)]
pub enum ApiError {
    /// connection, timeout or body read failure
    #[error("request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// server answered with a non-2xx status
    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: reqwest::StatusCode },

    /// body was not the documented json envelope
    #[error("unexpected response from {url}: {reason}")]
    Decode { url: String, reason: String },
}

/// result of a successful history request
#[derive(Clone, Debug, PartialEq)]
pub enum HistoryOutcome {
    /// the api holds readings for the device
    Records(RawFeed),
    /// the api answered but reported zero records
    NoRecords,
}

/// source of history and device listings
///
/// implemented by the http client; tests drive the pipeline with a
/// scripted source instead.
#[allow(async_fn_in_trait)]
pub trait FeedSource {
    async fn fetch_history(&self, device_id: &str) -> Result<HistoryOutcome, ApiError>;
    async fn fetch_latest_devices(&self, project_name: &str) -> Result<Vec<String>, ApiError>;
}

#[derive(Deserialize)]
struct LatestResponse {
    #[serde(default)]
    feeds: Vec<LatestFeed>,
}

#[derive(Deserialize)]
struct LatestFeed {
    #[serde(default)]
    device_id: Option<String>,
}

/// http client for the pm2.5 api
pub struct PmApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl PmApiClient {
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|source| ApiError::Http { url: config.base_url.clone(), source })?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn history_url(&self, device_id: &str) -> String {
        format!("{}/device/{}/history/", self.base_url, device_id)
    }

    pub fn latest_url(&self, project_name: &str) -> String {
        format!("{}/project/{}/latest/", self.base_url, project_name.to_lowercase())
    }

    // GET and decode json, mapping every failure onto ApiError
    async fn get_json(&self, url: &str) -> Result<Value, ApiError> {
        let http_err = |source: reqwest::Error| ApiError::Http { url: url.to_string(), source };

        let response = self.http.get(url).send().await.map_err(http_err)?;
        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status { url: url.to_string(), status });
        }

        let body = response.bytes().await.map_err(http_err)?;
        serde_json::from_slice(&body).map_err(|e| ApiError::Decode {
            url: url.to_string(),
            reason: e.to_string(),
        })
    }
}

impl FeedSource for PmApiClient {
    #[instrument(skip(self))]
    async fn fetch_history(&self, device_id: &str) -> Result<HistoryOutcome, ApiError> {
        let url = self.history_url(device_id);
        let body = self.get_json(&url).await?;
        classify_history(&url, body)
    }

    #[instrument(skip(self))]
    async fn fetch_latest_devices(&self, project_name: &str) -> Result<Vec<String>, ApiError> {
        let url = self.latest_url(project_name);
        let body = self.get_json(&url).await?;
        device_ids(&url, body)
    }
}

/// split a history body into records / no-records using `num_of_records`
fn classify_history(url: &str, body: Value) -> Result<HistoryOutcome, ApiError> {
    let count = body
        .get("num_of_records")
        .and_then(Value::as_i64)
        .ok_or_else(|| ApiError::Decode {
            url: url.to_string(),
            reason: "missing integer field `num_of_records`".to_string(),
        })?;

    debug!(records = count, "History fetched");
    if count == 0 {
        Ok(HistoryOutcome::NoRecords)
    } else {
        Ok(HistoryOutcome::Records(RawFeed(body)))
    }
}

/// device ids listed in a latest-devices body
fn device_ids(url: &str, body: Value) -> Result<Vec<String>, ApiError> {
    let latest: LatestResponse = serde_json::from_value(body).map_err(|e| ApiError::Decode {
        url: url.to_string(),
        reason: e.to_string(),
    })?;

    Ok(latest.feeds.into_iter().filter_map(|f| f.device_id).collect())
}

// ==============================================================================
// tests
// ==============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const URL: &str = "http://api.test/device/dev/history/";

    fn client(base_url: &str) -> PmApiClient {
        PmApiClient::new(&ApiConfig { base_url: base_url.to_string(), timeout_seconds: 5 }).unwrap()
    }

    #[test]
    fn test_urls() {
        let c = client("https://pm25.lass-net.org/API-1.0.0/");
        assert_eq!(
            c.history_url("08BEAC0AB11E"),
            "https://pm25.lass-net.org/API-1.0.0/device/08BEAC0AB11E/history/"
        );
        assert_eq!(
            c.latest_url("AirBox"),
            "https://pm25.lass-net.org/API-1.0.0/project/airbox/latest/"
        );
    }

    #[test]
    fn test_history_with_records() {
        let body = json!({ "num_of_records": 1, "feeds": [], "some": "data" });
        let outcome = classify_history(URL, body.clone()).unwrap();
        assert_eq!(outcome, HistoryOutcome::Records(RawFeed(body)));
    }

    #[test]
    fn test_history_without_records() {
        let body = json!({ "num_of_records": 0, "feeds": [] });
        assert_eq!(classify_history(URL, body).unwrap(), HistoryOutcome::NoRecords);
    }

    #[test]
    fn test_history_missing_count_is_decode_error() {
        let err = classify_history(URL, json!({ "feeds": [] })).unwrap_err();
        assert!(matches!(err, ApiError::Decode { .. }));
    }

    #[test]
    fn test_device_ids() {
        let body = json!({
            "feeds": [
                { "device_id": "74DA38F7C254", "s_d0": 12 },
                { "s_d0": 3 },
                { "device_id": "B827EB0E6BD4" }
            ]
        });
        assert_eq!(
            device_ids(URL, body).unwrap(),
            vec!["74DA38F7C254".to_string(), "B827EB0E6BD4".to_string()]
        );
    }

    #[test]
    fn test_device_ids_empty() {
        assert!(device_ids(URL, json!({ "feeds": [] })).unwrap().is_empty());
        assert!(device_ids(URL, json!({ "version": "x" })).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unreachable_host_is_http_error() {
        // port 9 (discard) on localhost is expected to refuse connections
        let c = client("http://127.0.0.1:9");
        let err = c.fetch_history("dev").await.unwrap_err();
        assert!(matches!(err, ApiError::Http { .. }));
    }
}
