use anyhow::Result;
use desigo_bridge::*;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::FormatTime;

struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(
            w,
            "{}",
            chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z")
        )
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_timer(LocalTimer)
        .with_env_filter(filter)
        .init();

    let app_config = config::AppConfig::load()?;

    let statistics_repo =
        Arc::new(statistics_repo::StatisticsRepo::connect(&app_config.database.path).await?);
    statistics_repo.init().await?;

    let source = Arc::new(source::HttpSeriesSource::new(
        source::Credentials {
            username: app_config.source.username.clone(),
            password: app_config.source.password.clone(),
        },
        Duration::from_secs(app_config.source.request_timeout_secs),
    )?);

    let coordinator = coordinator::UpdateCoordinator::new(
        app_config.source.url.clone(),
        source,
        statistics_repo.clone(),
    )
    .with_history_start(app_config.source.history_start.clone());
    for series in &app_config.series {
        coordinator.register(series.to_subscription())?;
        coordinator.activate(&series.key, series.statistic_id())?;
    }
    let coordinator = Arc::new(coordinator);
    tracing::info!(
        series_count = app_config.series.len(),
        update_interval_secs = app_config.source.update_interval_secs,
        "subscriptions registered"
    );

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
    let worker_handle = worker::spawn(
        coordinator.clone(),
        worker::WorkerConfig {
            update_interval_secs: app_config.source.update_interval_secs,
        },
        shutdown_rx,
    );

    let app = routes::app(coordinator, statistics_repo);
    let addr = format!("{}:{}", app_config.server.host, app_config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on http://{}", addr);

    tokio::select! {
        result = axum::serve(listener, app) => {
            result?;
        }
        _ = async {
            #[cfg(unix)]
            {
                let mut sigterm = match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                    Ok(s) => s,
                    Err(_) => {
                        let _ = tokio::signal::ctrl_c().await;
                        return;
                    }
                };
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = sigterm.recv() => {}
                }
            }
            #[cfg(not(unix))]
            {
                let _ = tokio::signal::ctrl_c().await;
            }
        } => {
            tracing::info!("Received shutdown signal");
            let _ = shutdown_tx.send(());
            let _ = worker_handle.await;
        }
    }

    Ok(())
}
