// Hourly buckets and the statistic records written to the sink

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// Aggregate over the samples of one clock hour. `count` is always >= 1.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HourBucket {
    pub hour_start: DateTime<FixedOffset>,
    pub sum: f64,
    pub count: u32,
    pub last_value: f64,
}

impl HourBucket {
    pub fn mean(&self) -> f64 {
        self.sum / self.count as f64
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatisticMetadata {
    pub has_mean: bool,
    pub has_sum: bool,
    pub name: Option<String>,
    pub source: String,
    pub statistic_id: String,
    pub unit: String,
}

/// One hourly statistic row. `sum` is only present for cumulative sensors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatisticRecord {
    pub start: DateTime<FixedOffset>,
    pub state: f64,
    pub mean: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sum: Option<f64>,
}

impl StatisticRecord {
    pub fn from_bucket(bucket: &HourBucket, has_sum: bool) -> Self {
        Self {
            start: bucket.hour_start,
            state: bucket.last_value,
            mean: bucket.mean(),
            sum: has_sum.then_some(bucket.last_value),
        }
    }
}
