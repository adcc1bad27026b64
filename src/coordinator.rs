// Update coordinator: subscription registry, latest snapshot, and the fetch -> aggregate -> import cycle.
//
// Each subscription starts pending its first fetch. While any subscription is pending, the
// fetch URL asks for the full history; once all have been imported, the source's default
// (recent) window is used.

use std::sync::{Arc, RwLock};

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::aggregation::aggregate_hourly;
use crate::matcher::find_series;
use crate::models::{
    DOMAIN, FetchedSeries, SeriesSubscription, StatisticMetadata, StatisticRecord,
};
use crate::source::{FetchError, SeriesSource};
use crate::statistics_repo::StatisticsSink;
use crate::url_query;

/// History start requested while any subscription has not been imported yet.
pub const DEFAULT_HISTORY_START: &str = "2000-01-01";

#[derive(Error, Debug)]
pub enum CoordinatorError {
    #[error("subscription key {0:?} is already registered")]
    DuplicateKey(String),
    #[error("unknown subscription key {0:?}")]
    UnknownKey(String),
}

/// A cycle that failed before any statistics were written.
#[derive(Error, Debug)]
pub enum CycleError {
    #[error("fetch from {url} failed: {source}")]
    Fetch {
        url: String,
        #[source]
        source: FetchError,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub series_fetched: usize,
    /// Subscriptions whose statistics were written.
    pub imported: usize,
    /// Subscriptions whose series was absent from the response.
    pub missing: usize,
    /// Subscriptions skipped because they have no statistic id yet.
    pub deferred: usize,
    /// Subscriptions whose import failed at the sink.
    pub failed: usize,
    pub records_written: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    Completed(CycleReport),
    /// Another cycle was still running.
    Skipped,
}

/// Read-only view of one registration, for listing and tests.
#[derive(Debug, Clone, PartialEq)]
pub struct SubscriptionStatus {
    pub subscription: SeriesSubscription,
    pub statistic_id: Option<String>,
    pub first_fetch_complete: bool,
}

struct Registration {
    subscription: SeriesSubscription,
    statistic_id: Option<String>,
    first_fetch_complete: bool,
}

pub struct UpdateCoordinator {
    base_url: String,
    history_start: String,
    source: Arc<dyn SeriesSource>,
    sink: Arc<dyn StatisticsSink>,
    registry: RwLock<Vec<Registration>>,
    snapshot: RwLock<Arc<Vec<FetchedSeries>>>,
    cycle_lock: tokio::sync::Mutex<()>,
}

impl UpdateCoordinator {
    pub fn new(
        base_url: impl Into<String>,
        source: Arc<dyn SeriesSource>,
        sink: Arc<dyn StatisticsSink>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            history_start: DEFAULT_HISTORY_START.to_string(),
            source,
            sink,
            registry: RwLock::new(Vec::new()),
            snapshot: RwLock::new(Arc::new(Vec::new())),
            cycle_lock: tokio::sync::Mutex::new(()),
        }
    }

    pub fn with_history_start(mut self, history_start: impl Into<String>) -> Self {
        self.history_start = history_start.into();
        self
    }

    /// Adds a subscription, pending its first fetch and not yet activated.
    pub fn register(&self, subscription: SeriesSubscription) -> Result<(), CoordinatorError> {
        let mut registry = self.registry.write().unwrap_or_else(|e| e.into_inner());
        if registry
            .iter()
            .any(|r| r.subscription.key == subscription.key)
        {
            return Err(CoordinatorError::DuplicateKey(subscription.key));
        }
        debug!(key = %subscription.key, series = %subscription.identity, "subscription registered");
        registry.push(Registration {
            subscription,
            statistic_id: None,
            first_fetch_complete: false,
        });
        Ok(())
    }

    /// Assigns the durable statistic id. Until then the subscription is skipped by cycles.
    pub fn activate(
        &self,
        key: &str,
        statistic_id: impl Into<String>,
    ) -> Result<(), CoordinatorError> {
        let mut registry = self.registry.write().unwrap_or_else(|e| e.into_inner());
        let reg = registry
            .iter_mut()
            .find(|r| r.subscription.key == key)
            .ok_or_else(|| CoordinatorError::UnknownKey(key.to_string()))?;
        reg.statistic_id = Some(statistic_id.into());
        Ok(())
    }

    pub fn subscriptions(&self) -> Vec<SubscriptionStatus> {
        let registry = self.registry.read().unwrap_or_else(|e| e.into_inner());
        registry.iter().map(Registration::status).collect()
    }

    pub fn subscription(&self, key: &str) -> Option<SubscriptionStatus> {
        let registry = self.registry.read().unwrap_or_else(|e| e.into_inner());
        registry
            .iter()
            .find(|r| r.subscription.key == key)
            .map(Registration::status)
    }

    /// Latest fetched snapshot (empty before the first successful cycle).
    pub fn snapshot(&self) -> Arc<Vec<FetchedSeries>> {
        self.snapshot
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Last value of the subscription's series in the current snapshot, or `None` when unknown.
    pub fn current_value(&self, key: &str) -> Option<f64> {
        let identity = self.subscription(key)?.subscription.identity;
        let snapshot = self.snapshot();
        find_series(&identity, &snapshot)?.last_value()
    }

    /// Base URL, widened to the full history while any subscription is still pending.
    pub fn fetch_url(&self) -> String {
        let any_pending = self
            .registry
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .any(|r| !r.first_fetch_complete);
        if any_pending {
            url_query::augment(&self.base_url, [("start", self.history_start.as_str())])
        } else {
            self.base_url.clone()
        }
    }

    /// Fetches, replaces the snapshot, and imports hourly statistics for every activated subscription.
    ///
    /// A fetch or parse failure leaves the snapshot and all subscription states untouched.
    pub async fn run_cycle(&self) -> Result<CycleOutcome, CycleError> {
        let Ok(_guard) = self.cycle_lock.try_lock() else {
            debug!("previous update cycle still running; skipping");
            return Ok(CycleOutcome::Skipped);
        };

        let url = self.fetch_url();
        info!(url = %url, "fetching series");
        let data = self
            .source
            .fetch(&url)
            .await
            .map_err(|source| CycleError::Fetch {
                url: url.clone(),
                source,
            })?;
        let data = Arc::new(data);
        *self.snapshot.write().unwrap_or_else(|e| e.into_inner()) = data.clone();

        let mut report = CycleReport {
            series_fetched: data.len(),
            ..CycleReport::default()
        };

        // Cloned so no lock is held across the sink's awaits.
        let work: Vec<(SeriesSubscription, Option<String>)> = self
            .registry
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .map(|r| (r.subscription.clone(), r.statistic_id.clone()))
            .collect();

        for (subscription, statistic_id) in work {
            let Some(statistic_id) = statistic_id else {
                debug!(key = %subscription.key, "subscription not activated yet; deferring");
                report.deferred += 1;
                continue;
            };

            let Some(series) = find_series(&subscription.identity, &data) else {
                warn!(
                    key = %subscription.key,
                    "Failed to find data series \"{}\" in server response",
                    subscription.identity
                );
                report.missing += 1;
                continue;
            };

            let (metadata, records) = build_statistics(&subscription, &statistic_id, series);
            if let Err(e) = self.sink.import_statistics(&metadata, &records).await {
                warn!(
                    error = %e,
                    key = %subscription.key,
                    statistic_id = %statistic_id,
                    operation = "import_statistics",
                    "statistics import failed"
                );
                report.failed += 1;
                continue;
            }

            report.imported += 1;
            report.records_written += records.len();
            self.mark_first_fetch_complete(&subscription.key);
        }

        info!(
            series_fetched = report.series_fetched,
            imported = report.imported,
            missing = report.missing,
            deferred = report.deferred,
            failed = report.failed,
            records_written = report.records_written,
            "update cycle complete"
        );
        Ok(CycleOutcome::Completed(report))
    }

    fn mark_first_fetch_complete(&self, key: &str) {
        let mut registry = self.registry.write().unwrap_or_else(|e| e.into_inner());
        if let Some(reg) = registry.iter_mut().find(|r| r.subscription.key == key) {
            reg.first_fetch_complete = true;
        }
    }
}

impl Registration {
    fn status(&self) -> SubscriptionStatus {
        SubscriptionStatus {
            subscription: self.subscription.clone(),
            statistic_id: self.statistic_id.clone(),
            first_fetch_complete: self.first_fetch_complete,
        }
    }
}

/// Metadata and one record per hour for a matched series.
pub fn build_statistics(
    subscription: &SeriesSubscription,
    statistic_id: &str,
    series: &FetchedSeries,
) -> (StatisticMetadata, Vec<StatisticRecord>) {
    let has_sum = subscription.state_class.is_cumulative();
    let metadata = StatisticMetadata {
        has_mean: true,
        has_sum,
        name: Some(subscription.name.clone()),
        source: DOMAIN.to_string(),
        statistic_id: statistic_id.to_string(),
        unit: subscription.unit.clone(),
    };
    let records = aggregate_hourly(&series.samples)
        .iter()
        .map(|bucket| StatisticRecord::from_bucket(bucket, has_sum))
        .collect();
    (metadata, records)
}
