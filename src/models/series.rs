// Fetched time series: identity, samples, and the scraper JSON payload shape

use chrono::{DateTime, FixedOffset};
use serde::Deserialize;

/// (group, name) pair identifying a series in a scraper response. Compared by exact string equality.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SeriesIdentity {
    pub group: String,
    pub name: String,
}

impl SeriesIdentity {
    pub fn new(group: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            name: name.into(),
        }
    }
}

impl std::fmt::Display for SeriesIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} - {}", self.group, self.name)
    }
}

/// One timestamped measurement. The source's UTC offset is kept as-is.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub timestamp: DateTime<FixedOffset>,
    pub value: f64,
}

impl Sample {
    pub fn new(timestamp: DateTime<FixedOffset>, value: f64) -> Self {
        Self { timestamp, value }
    }
}

/// One series of a fetch cycle. Samples are in source order (assumed chronological).
#[derive(Debug, Clone, PartialEq)]
pub struct FetchedSeries {
    pub identity: SeriesIdentity,
    pub unit: String,
    pub samples: Vec<Sample>,
}

impl FetchedSeries {
    /// Value of the last sample, if any.
    pub fn last_value(&self) -> Option<f64> {
        self.samples.last().map(|s| s.value)
    }
}

/// Series as it appears on the wire: `{group, name, unit, data: [[ts, value], ...]}`.
#[derive(Debug, Clone, Deserialize)]
pub struct RawSeries {
    pub group: String,
    pub name: String,
    pub unit: String,
    pub data: Vec<(String, f64)>,
}
