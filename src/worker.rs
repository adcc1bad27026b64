// Background update worker: drives UpdateCoordinator::run_cycle on a fixed interval.
// The first tick fires immediately, which performs the initial (full history) load.

use std::sync::Arc;
use tokio::time::{Duration, interval};
use tracing::Instrument;

use crate::coordinator::{CycleOutcome, UpdateCoordinator};

pub struct WorkerConfig {
    pub update_interval_secs: u64,
}

/// Spawns the worker. It exits when `shutdown_rx` fires (or its sender is dropped).
pub fn spawn(
    coordinator: Arc<UpdateCoordinator>,
    config: WorkerConfig,
    mut shutdown_rx: tokio::sync::oneshot::Receiver<()>,
) -> tokio::task::JoinHandle<()> {
    let worker_span = tracing::span!(
        tracing::Level::DEBUG,
        "update_worker",
        update_interval_secs = config.update_interval_secs
    );
    tokio::spawn(async move {
        let mut tick = interval(Duration::from_secs(config.update_interval_secs));
        // A slow cycle makes later ticks get skipped rather than queued.
        tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        let mut cycles_failed_total: u64 = 0;

        loop {
            tokio::select! {
                _ = tick.tick() => {
                    match coordinator.run_cycle().await {
                        Ok(CycleOutcome::Completed(_)) => {}
                        Ok(CycleOutcome::Skipped) => {
                            tracing::debug!(operation = "run_cycle", "cycle skipped; previous still running");
                        }
                        Err(e) => {
                            cycles_failed_total += 1;
                            tracing::warn!(
                                error = %e,
                                operation = "run_cycle",
                                cycles_failed_total,
                                "update cycle failed; retrying next tick"
                            );
                        }
                    }
                }
                _ = &mut shutdown_rx => {
                    tracing::debug!("Update worker shutting down");
                    break;
                }
            }
        }
    }
    .instrument(worker_span))
}
