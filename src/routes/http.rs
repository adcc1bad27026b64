// GET handlers: version, sensors (live value), sensor statistics and metadata

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use super::AppState;
use crate::coordinator::SubscriptionStatus;
use crate::models::{StateClass, StatisticRecord};

const DEFAULT_STATISTICS_LIMIT: u32 = 48;
const MAX_STATISTICS_LIMIT: u32 = 24 * 366;

/// Sensor as exposed over HTTP; `value` is null while unknown.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct SensorView {
    key: String,
    unique_id: String,
    name: String,
    group: String,
    series: String,
    unit: String,
    icon: Option<String>,
    device_class: Option<String>,
    state_class: StateClass,
    statistic_id: Option<String>,
    first_fetch_complete: bool,
    value: Option<f64>,
}

impl SensorView {
    fn new(status: SubscriptionStatus, value: Option<f64>) -> Self {
        let s = status.subscription;
        Self {
            unique_id: s.unique_id(),
            key: s.key,
            name: s.name,
            group: s.identity.group,
            series: s.identity.name,
            unit: s.unit,
            icon: s.icon,
            device_class: s.device_class,
            state_class: s.state_class,
            statistic_id: status.statistic_id,
            first_fetch_complete: status.first_fetch_complete,
            value,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct StatisticsQuery {
    limit: Option<u32>,
}

/// GET /version: service name and version (from Cargo.toml at build time).
pub(super) async fn version_handler() -> impl IntoResponse {
    Json(serde_json::json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

pub(super) async fn list_sensors_handler(State(state): State<AppState>) -> Json<Vec<SensorView>> {
    let sensors = state
        .coordinator
        .subscriptions()
        .into_iter()
        .map(|status| {
            let value = state.coordinator.current_value(&status.subscription.key);
            SensorView::new(status, value)
        })
        .collect();
    Json(sensors)
}

pub(super) async fn sensor_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<SensorView>, StatusCode> {
    let status = state
        .coordinator
        .subscription(&key)
        .ok_or(StatusCode::NOT_FOUND)?;
    let value = state.coordinator.current_value(&key);
    Ok(Json(SensorView::new(status, value)))
}

/// GET /api/sensors/{key}/statistics: stored hourly rows, oldest first.
pub(super) async fn sensor_statistics_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Query(query): Query<StatisticsQuery>,
) -> Response {
    let Some(statistic_id) = state
        .coordinator
        .subscription(&key)
        .and_then(|s| s.statistic_id)
    else {
        return StatusCode::NOT_FOUND.into_response();
    };
    let limit = query
        .limit
        .unwrap_or(DEFAULT_STATISTICS_LIMIT)
        .clamp(1, MAX_STATISTICS_LIMIT);
    match state
        .statistics_repo
        .get_statistics(&statistic_id, limit)
        .await
    {
        Ok(rows) => Json::<Vec<StatisticRecord>>(rows).into_response(),
        Err(e) => {
            tracing::warn!(error = %e, statistic_id = %statistic_id, "get_statistics failed");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// GET /api/sensors/{key}/metadata: statistic metadata as last imported; 404 before the first import.
pub(super) async fn sensor_metadata_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Response {
    let Some(statistic_id) = state
        .coordinator
        .subscription(&key)
        .and_then(|s| s.statistic_id)
    else {
        return StatusCode::NOT_FOUND.into_response();
    };
    match state.statistics_repo.get_metadata(&statistic_id).await {
        Ok(Some(metadata)) => Json(metadata).into_response(),
        Ok(None) => StatusCode::NOT_FOUND.into_response(),
        Err(e) => {
            tracing::warn!(error = %e, statistic_id = %statistic_id, "get_metadata failed");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
