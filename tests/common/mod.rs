// Shared test helpers: model builders, a scripted source and a recording sink

#![allow(dead_code)]

use async_trait::async_trait;
use desigo_bridge::models::*;
use desigo_bridge::source::{FetchError, SeriesSource, parse_payload};
use desigo_bridge::statistics_repo::StatisticsSink;
use std::collections::VecDeque;
use std::sync::Mutex;

pub fn subscription(key: &str, group: &str, name: &str, state_class: StateClass) -> SeriesSubscription {
    SeriesSubscription {
        key: key.into(),
        name: format!("{} {}", group, name),
        identity: SeriesIdentity::new(group, name),
        state_class,
        device_class: None,
        unit: "kWh".into(),
        icon: None,
    }
}

pub fn ts(s: &str) -> chrono::DateTime<chrono::FixedOffset> {
    chrono::DateTime::parse_from_rfc3339(s).unwrap()
}

pub fn series(group: &str, name: &str, points: &[(&str, f64)]) -> FetchedSeries {
    FetchedSeries {
        identity: SeriesIdentity::new(group, name),
        unit: "kWh".into(),
        samples: points.iter().map(|(t, v)| Sample::new(ts(t), *v)).collect(),
    }
}

/// Source answering each fetch with the next scripted response; records requested URLs.
#[derive(Default)]
pub struct ScriptedSource {
    responses: Mutex<VecDeque<Result<String, String>>>,
    pub urls: Mutex<Vec<String>>,
}

impl ScriptedSource {
    pub fn push_body(&self, body: &str) {
        self.responses.lock().unwrap().push_back(Ok(body.to_string()));
    }

    /// Next fetch fails like a transport error would.
    pub fn push_failure(&self) {
        self.responses
            .lock()
            .unwrap()
            .push_back(Err("connection refused".into()));
    }

    pub fn requested_urls(&self) -> Vec<String> {
        self.urls.lock().unwrap().clone()
    }
}

#[async_trait]
impl SeriesSource for ScriptedSource {
    async fn fetch(&self, url: &str) -> Result<Vec<FetchedSeries>, FetchError> {
        self.urls.lock().unwrap().push(url.to_string());
        let next = self
            .responses
            .lock()
            .unwrap()
            .pop_front()
            .expect("no scripted response left");
        match next {
            Ok(body) => parse_payload(&body),
            Err(_) => Err(FetchError::Status(reqwest::StatusCode::BAD_GATEWAY)),
        }
    }
}

/// Sink keeping every import in memory. Imports for `fail_statistic_id` return an error.
#[derive(Default)]
pub struct RecordingSink {
    pub imports: Mutex<Vec<(StatisticMetadata, Vec<StatisticRecord>)>>,
    pub fail_statistic_id: Mutex<Option<String>>,
}

impl RecordingSink {
    pub fn imports(&self) -> Vec<(StatisticMetadata, Vec<StatisticRecord>)> {
        self.imports.lock().unwrap().clone()
    }
}

#[async_trait]
impl StatisticsSink for RecordingSink {
    async fn import_statistics(
        &self,
        metadata: &StatisticMetadata,
        records: &[StatisticRecord],
    ) -> anyhow::Result<()> {
        if self.fail_statistic_id.lock().unwrap().as_deref() == Some(metadata.statistic_id.as_str()) {
            anyhow::bail!("disk full");
        }
        self.imports
            .lock()
            .unwrap()
            .push((metadata.clone(), records.to_vec()));
        Ok(())
    }
}

pub const TWO_SERIES_BODY: &str = r#"[
    {"group": "Heat pump", "name": "Energy", "unit": "kWh", "data": [
        ["2024-01-01T00:10:00Z", 1.0],
        ["2024-01-01T00:50:00Z", 3.0],
        ["2024-01-01T01:05:00Z", 5.0]
    ]},
    {"group": "Outside", "name": "Temperature", "unit": "°C", "data": [
        ["2024-01-01T00:15:00Z", -2.0],
        ["2024-01-01T00:45:00Z", -4.0]
    ]}
]"#;
