//! Pass-through client for the precipitation-frequency service.
//!
//! Forwards a coordinate pair to the upstream service and hands back the raw
//! response body for [`parse_frequency_table`](crate::frequency::parse_frequency_table).

use log::{info, warn};
use reqwest::{Client, StatusCode};
use std::time::Duration;
use thiserror::Error;

/// NOAA HDSC point precipitation-frequency CSV endpoint (partial duration
/// series depths in inches). Latitude and longitude are appended as `lat`/`lon`.
pub const DEFAULT_PFDS_URL: &str =
    "https://hdsc.nws.noaa.gov/cgi-bin/hdsc/new/fe_text_mean.csv?data=depth&units=english&series=pds";

const MAX_TRIES: u32 = 3;
const INITIAL_BACKOFF_MILLIS: u64 = 1000;

/// Failures fetching a frequency table, each mapped to an HTTP status a
/// relaying service would answer with.
#[derive(Error, Debug, PartialEq, Clone)]
pub enum FetchError {
    #[error("Invalid coordinates: latitude {latitude}, longitude {longitude}")]
    InvalidCoordinates { latitude: f64, longitude: f64 },

    #[error("No precipitation frequency data for this location")]
    NoData,

    #[error("Frequency service unreachable: {0}")]
    Unreachable(String),

    #[error("Frequency service returned status {0}")]
    UpstreamStatus(u16),

    #[error("Frequency service timed out")]
    Timeout,
}

impl FetchError {
    pub fn status_code(&self) -> u16 {
        match self {
            FetchError::InvalidCoordinates { .. } => 400,
            FetchError::NoData => 404,
            FetchError::Unreachable(_) => 502,
            FetchError::UpstreamStatus(_) => 503,
            FetchError::Timeout => 504,
        }
    }

    fn is_transient(&self) -> bool {
        match self {
            FetchError::Unreachable(_) | FetchError::Timeout => true,
            FetchError::UpstreamStatus(code) => *code >= 500,
            FetchError::InvalidCoordinates { .. } | FetchError::NoData => false,
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            FetchError::Timeout
        } else {
            FetchError::Unreachable(e.to_string())
        }
    }
}

pub fn validate_coordinates(latitude: f64, longitude: f64) -> Result<(), FetchError> {
    let valid = latitude.is_finite()
        && longitude.is_finite()
        && (-90.0..=90.0).contains(&latitude)
        && (-180.0..=180.0).contains(&longitude);
    if valid {
        Ok(())
    } else {
        Err(FetchError::InvalidCoordinates {
            latitude,
            longitude,
        })
    }
}

/// The service answers locations outside its project areas with a short
/// error message instead of a table.
fn body_reports_no_data(body: &str) -> bool {
    let lowered = body.trim().to_lowercase();
    lowered.is_empty()
        || lowered.starts_with("error")
        || lowered.contains("not within a project area")
}

pub struct FrequencyClient {
    client: Client,
    base_url: String,
}

impl FrequencyClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<FrequencyClient, FetchError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(FrequencyClient {
            client,
            base_url: base_url.to_string(),
        })
    }

    async fn fetch_once(&self, latitude: f64, longitude: f64) -> Result<String, FetchError> {
        let response = self
            .client
            .get(&self.base_url)
            .query(&[("lat", latitude), ("lon", longitude)])
            .send()
            .await?;
        match response.status() {
            StatusCode::OK => {
                let body = response.text().await?;
                if body_reports_no_data(&body) {
                    Err(FetchError::NoData)
                } else {
                    Ok(body)
                }
            }
            StatusCode::NOT_FOUND => Err(FetchError::NoData),
            status => Err(FetchError::UpstreamStatus(status.as_u16())),
        }
    }

    /// Fetch the raw frequency table for a location, retrying transient
    /// failures with exponential backoff.
    pub async fn fetch(&self, latitude: f64, longitude: f64) -> Result<String, FetchError> {
        validate_coordinates(latitude, longitude)?;
        let mut sleep_millis = INITIAL_BACKOFF_MILLIS;
        let mut attempt = 1;
        loop {
            match self.fetch_once(latitude, longitude).await {
                Ok(body) => return Ok(body),
                Err(e) if e.is_transient() && attempt < MAX_TRIES => {
                    warn!(
                        "Attempt {}/{}: frequency fetch for ({}, {}) failed: {}",
                        attempt, MAX_TRIES, latitude, longitude, e
                    );
                    info!("Sleeping for {} milliseconds before retry", sleep_millis);
                    tokio::time::sleep(Duration::from_millis(sleep_millis)).await;
                    sleep_millis *= 2;
                    attempt += 1;
                }
                Err(e) => {
                    warn!(
                        "frequency fetch for ({}, {}) failed: {}",
                        latitude, longitude, e
                    );
                    return Err(e);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_coordinates() {
        assert!(validate_coordinates(38.9, -77.03).is_ok());
        assert!(validate_coordinates(90.0, 180.0).is_ok());
        assert_eq!(
            validate_coordinates(91.0, 0.0).unwrap_err().status_code(),
            400
        );
        assert!(validate_coordinates(0.0, -180.5).is_err());
        assert!(validate_coordinates(f64::NAN, 0.0).is_err());
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(FetchError::NoData.status_code(), 404);
        assert_eq!(FetchError::Unreachable("refused".into()).status_code(), 502);
        assert_eq!(FetchError::UpstreamStatus(500).status_code(), 503);
        assert_eq!(FetchError::Timeout.status_code(), 504);
    }

    #[test]
    fn test_only_upstream_failures_are_retried() {
        assert!(FetchError::Timeout.is_transient());
        assert!(FetchError::UpstreamStatus(502).is_transient());
        assert!(!FetchError::UpstreamStatus(403).is_transient());
        assert!(!FetchError::NoData.is_transient());
    }

    #[test]
    fn test_body_reports_no_data() {
        assert!(body_reports_no_data("  \n"));
        assert!(body_reports_no_data(
            "Error 3.0: Selected location is not within a project area."
        ));
        assert!(!body_reports_no_data(
            "by duration for ARI (years):, 2\n60-min:, 1.0\n"
        ));
    }
}
