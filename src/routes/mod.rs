// HTTP routes: live sensor values and stored statistics

mod http;

use axum::{Router, routing::get};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::coordinator::UpdateCoordinator;
use crate::statistics_repo::StatisticsRepo;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) coordinator: Arc<UpdateCoordinator>,
    pub(crate) statistics_repo: Arc<StatisticsRepo>,
}

pub fn app(coordinator: Arc<UpdateCoordinator>, statistics_repo: Arc<StatisticsRepo>) -> Router {
    let state = AppState {
        coordinator,
        statistics_repo,
    };
    Router::new()
        .route("/", get(|| async { "Hello from desigo-bridge!" })) // GET /
        .route("/version", get(http::version_handler)) // GET /version
        .route("/api/sensors", get(http::list_sensors_handler)) // GET /api/sensors
        .route("/api/sensors/{key}", get(http::sensor_handler)) // GET /api/sensors/{key}
        .route(
            "/api/sensors/{key}/statistics",
            get(http::sensor_statistics_handler),
        ) // GET /api/sensors/{key}/statistics?limit=N
        .route(
            "/api/sensors/{key}/metadata",
            get(http::sensor_metadata_handler),
        ) // GET /api/sensors/{key}/metadata
        .layer(CorsLayer::new().allow_origin(Any))
        .with_state(state)
}
