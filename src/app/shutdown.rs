//! Graceful shutdown handling.

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::GeoGate;

/// Shuts down all background tasks gracefully.
///
/// Cancels `cancel` (the accept loop and the stats logger listen on it),
/// waits for the stats logger, then stops the database refresh timer.
pub async fn shutdown_gracefully(
    cancel: CancellationToken,
    stats_task: Option<JoinHandle<()>>,
    gate: &GeoGate,
) {
    cancel.cancel();
    if let Some(stats_task) = stats_task {
        let _ = stats_task.await;
    }

    gate.shutdown().await;
}
