use std::collections::HashSet;

use serde::Deserialize;

use crate::coordinator::DEFAULT_HISTORY_START;
use crate::models::{SeriesIdentity, SeriesSubscription, StateClass};

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub source: SourceConfig,
    pub database: DatabaseConfig,
    #[serde(default)]
    pub series: Vec<SeriesConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    pub url: String,
    pub username: String,
    pub password: String,
    #[serde(default = "default_update_interval_secs")]
    pub update_interval_secs: u64,
    /// Start date requested until every series has been imported once.
    #[serde(default = "default_history_start")]
    pub history_start: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_update_interval_secs() -> u64 {
    3600
}

fn default_history_start() -> String {
    DEFAULT_HISTORY_START.to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub path: String,
}

/// One sensor: which scraper series to follow and how to label its statistics.
#[derive(Debug, Clone, Deserialize)]
pub struct SeriesConfig {
    pub name: String,
    pub key: String,
    pub series_group: String,
    pub series_name: String,
    #[serde(default)]
    pub device_class: Option<String>,
    pub state_class: StateClass,
    pub unit_of_measurement: String,
    #[serde(default)]
    pub icon: Option<String>,
    /// Defaults to `sensor.desigo_<key>`.
    #[serde(default)]
    pub statistic_id: Option<String>,
}

impl SeriesConfig {
    pub fn to_subscription(&self) -> SeriesSubscription {
        SeriesSubscription {
            key: self.key.clone(),
            name: self.name.clone(),
            identity: SeriesIdentity::new(&self.series_group, &self.series_name),
            state_class: self.state_class,
            device_class: self.device_class.clone(),
            unit: self.unit_of_measurement.clone(),
            icon: self.icon.clone(),
        }
    }

    pub fn statistic_id(&self) -> String {
        self.statistic_id
            .clone()
            .unwrap_or_else(|| self.to_subscription().default_statistic_id())
    }
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        let path = std::env::var("CONFIG_FILE").unwrap_or_else(|_| "config.toml".into());
        let s = std::fs::read_to_string(&path)?;
        Self::load_from_str(&s)
    }

    /// Parse and validate config from a string (e.g. for tests).
    pub fn load_from_str(s: &str) -> anyhow::Result<Self> {
        let config: AppConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.server.port > 0,
            "server.port must be between 1 and 65535, got {}",
            self.server.port
        );
        anyhow::ensure!(!self.source.url.is_empty(), "source.url must be non-empty");
        anyhow::ensure!(
            self.source.url.starts_with("http://") || self.source.url.starts_with("https://"),
            "source.url must be an http(s) URL, got {:?}",
            self.source.url
        );
        anyhow::ensure!(
            !self.source.username.is_empty(),
            "source.username must be non-empty"
        );
        anyhow::ensure!(
            self.source.update_interval_secs > 0,
            "source.update_interval_secs must be > 0, got {}",
            self.source.update_interval_secs
        );
        anyhow::ensure!(
            self.source.request_timeout_secs > 0,
            "source.request_timeout_secs must be > 0, got {}",
            self.source.request_timeout_secs
        );
        anyhow::ensure!(
            chrono::NaiveDate::parse_from_str(&self.source.history_start, "%Y-%m-%d").is_ok(),
            "source.history_start must be a YYYY-MM-DD date, got {:?}",
            self.source.history_start
        );
        anyhow::ensure!(
            !self.database.path.is_empty(),
            "database.path must be non-empty"
        );
        anyhow::ensure!(
            !self.series.is_empty(),
            "series must contain at least one entry"
        );

        let mut keys = HashSet::new();
        for (i, s) in self.series.iter().enumerate() {
            for (field, value) in [
                ("name", &s.name),
                ("key", &s.key),
                ("series_group", &s.series_group),
                ("series_name", &s.series_name),
                ("unit_of_measurement", &s.unit_of_measurement),
            ] {
                anyhow::ensure!(!value.is_empty(), "series[{}].{} must be non-empty", i, field);
            }
            anyhow::ensure!(
                keys.insert(s.key.as_str()),
                "series[{}].key {:?} is duplicated",
                i,
                s.key
            );
            if let Some(icon) = &s.icon {
                anyhow::ensure!(
                    icon.split_once(':')
                        .is_some_and(|(prefix, name)| !prefix.is_empty() && !name.is_empty()),
                    "series[{}].icon must look like \"prefix:name\", got {:?}",
                    i,
                    icon
                );
            }
            if let Some(id) = &s.statistic_id {
                anyhow::ensure!(!id.is_empty(), "series[{}].statistic_id must be non-empty", i);
            }
        }
        Ok(())
    }
}
