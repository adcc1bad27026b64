// Locally configured interest in one scraper series, plus display metadata

use serde::{Deserialize, Serialize};

use super::SeriesIdentity;

/// Statistics domain every statistic id and unique id is prefixed with.
pub const DOMAIN: &str = "desigo";

/// Value-kind classification of a sensor; decides whether a `sum` statistic is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StateClass {
    Measurement,
    Total,
    TotalIncreasing,
}

impl StateClass {
    /// Running totals (`total`, `total_increasing`) carry a sum statistic.
    pub fn is_cumulative(self) -> bool {
        matches!(self, StateClass::Total | StateClass::TotalIncreasing)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SeriesSubscription {
    pub key: String,
    pub name: String,
    pub identity: SeriesIdentity,
    pub state_class: StateClass,
    pub device_class: Option<String>,
    pub unit: String,
    pub icon: Option<String>,
}

impl SeriesSubscription {
    /// Stable id derived from the configured key (e.g. "desigo_heat_pump_energy").
    pub fn unique_id(&self) -> String {
        format!("{}_{}", DOMAIN, self.key)
    }

    /// Statistic id used when the configuration does not name one.
    pub fn default_statistic_id(&self) -> String {
        format!("sensor.{}", self.unique_id())
    }
}
