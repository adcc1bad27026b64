// Scraper endpoint client: authenticated GET + payload parsing into typed series.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime};
use thiserror::Error;
use tracing::instrument;

use crate::models::{FetchedSeries, RawSeries, Sample, SeriesIdentity};

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("unexpected HTTP status {0}")]
    Status(reqwest::StatusCode),
    #[error("invalid payload: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid timestamp {value:?} in series \"{series}\"")]
    Timestamp { series: String, value: String },
}

/// Anything that can produce a full snapshot of series for a URL.
#[async_trait]
pub trait SeriesSource: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Vec<FetchedSeries>, FetchError>;
}

/// Credentials for HTTP Basic auth against the scraper.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

pub struct HttpSeriesSource {
    client: reqwest::Client,
    credentials: Credentials,
}

impl HttpSeriesSource {
    pub fn new(credentials: Credentials, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            credentials,
        })
    }
}

#[async_trait]
impl SeriesSource for HttpSeriesSource {
    #[instrument(skip(self), fields(source = "http", operation = "fetch"))]
    async fn fetch(&self, url: &str) -> Result<Vec<FetchedSeries>, FetchError> {
        let response = self
            .client
            .get(url)
            .basic_auth(&self.credentials.username, Some(&self.credentials.password))
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }
        let body = response.text().await?;
        parse_payload(&body)
    }
}

/// Parses a scraper response body. Any malformed timestamp fails the whole payload.
pub fn parse_payload(body: &str) -> Result<Vec<FetchedSeries>, FetchError> {
    let raw: Vec<RawSeries> = serde_json::from_str(body)?;
    raw.into_iter().map(parse_series).collect()
}

fn parse_series(raw: RawSeries) -> Result<FetchedSeries, FetchError> {
    let identity = SeriesIdentity::new(raw.group, raw.name);
    let mut samples = Vec::with_capacity(raw.data.len());
    for (ts, value) in raw.data {
        let Some(timestamp) = parse_timestamp(&ts) else {
            return Err(FetchError::Timestamp {
                series: identity.to_string(),
                value: ts,
            });
        };
        samples.push(Sample::new(timestamp, value));
    }
    Ok(FetchedSeries {
        identity,
        unit: raw.unit,
        samples,
    })
}

/// ISO-8601 timestamp with or without offset. Timestamps without an offset are read as UTC.
pub fn parse_timestamp(s: &str) -> Option<DateTime<FixedOffset>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt);
    }
    // RFC 3339 requires 'T'; accept the space-separated form too.
    if let Ok(dt) = DateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f%:z") {
        return Some(dt);
    }
    let naive = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })?;
    Some(naive.and_utc().fixed_offset())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_timestamp_variants() {
        let utc = parse_timestamp("2024-01-01T00:10:00Z").unwrap();
        assert_eq!(utc.offset().local_minus_utc(), 0);

        let offset = parse_timestamp("2024-01-01T00:10:00+01:00").unwrap();
        assert_eq!(offset.offset().local_minus_utc(), 3600);

        let spaced = parse_timestamp("2024-01-01 00:10:00+01:00").unwrap();
        assert_eq!(spaced, offset);

        let naive = parse_timestamp("2024-01-01T00:10:00").unwrap();
        assert_eq!(naive, utc);

        let fractional = parse_timestamp("2024-01-01T00:10:00.250").unwrap();
        assert_eq!(fractional.timestamp_subsec_millis(), 250);

        let date_only = parse_timestamp("2024-01-01").unwrap();
        assert_eq!(date_only, parse_timestamp("2024-01-01T00:00:00Z").unwrap());
    }

    #[test]
    fn parse_timestamp_rejects_garbage() {
        assert!(parse_timestamp("yesterday").is_none());
        assert!(parse_timestamp("2024-13-01T00:00:00Z").is_none());
        assert!(parse_timestamp("").is_none());
    }
}
