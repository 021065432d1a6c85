//! Periodic statistics logging.

use std::sync::Arc;
use std::time::{Duration, Instant};

use log::info;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::error_handling::GateStats;

/// Logs one line of request counters since `start_time`.
pub fn log_progress(start_time: Instant, stats: &GateStats) {
    let elapsed_secs = start_time.elapsed().as_secs_f64();
    let total = stats.total_requests();
    let rate = if elapsed_secs > 0.0 {
        total as f64 / elapsed_secs
    } else {
        0.0
    };
    info!(
        "Evaluated {} requests in {:.0} seconds (~{:.2} req/sec), {} denied",
        total,
        elapsed_secs,
        rate,
        stats.total_denied()
    );
}

/// Spawns a task calling [`log_progress`] every `period` until `cancel` fires.
pub fn spawn_stats_logger(
    stats: Arc<GateStats>,
    period: Duration,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    let start_time = Instant::now();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = interval.tick() => log_progress(start_time, &stats),
            }
        }
    })
}
