//! Periodic database refresh.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use super::manager::DatabaseManager;
use crate::error_handling::{GateStats, Outcome};

/// Background task reloading the database every `period`.
///
/// The first reload happens one full period after start; the startup load is
/// done by [`DatabaseManager::open`]. A failed reload is logged and counted,
/// and the next tick tries again. The task runs until [`RefreshTimer::stop`]
/// is called or the timer is dropped.
pub struct RefreshTimer {
    period: Duration,
    shutdown: CancellationToken,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl RefreshTimer {
    /// Spawns the refresh task on the current Tokio runtime.
    ///
    /// A period too long to schedule leaves the timer without a task: the
    /// database is never refreshed and [`RefreshTimer::is_running`] is false.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn start(manager: Arc<DatabaseManager>, stats: Arc<GateStats>, period: Duration) -> Self {
        let shutdown = CancellationToken::new();
        let task_shutdown = shutdown.clone();

        let Some(first_tick) = Instant::now().checked_add(period) else {
            log::warn!(
                "Refresh interval of {}s cannot be scheduled, database refresh disabled",
                period.as_secs()
            );
            return RefreshTimer {
                period,
                shutdown,
                handle: Mutex::new(None),
            };
        };
        let mut ticker = interval_at(first_tick, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let handle = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        // file I/O and parsing happen off the async workers
                        let loader = Arc::clone(&manager);
                        match tokio::task::spawn_blocking(move || loader.load_database()).await {
                            Ok(Ok(_)) => stats.increment(Outcome::RefreshSuccess),
                            Ok(Err(e)) => {
                                stats.increment(Outcome::RefreshFailure);
                                log::warn!(
                                    "Error updating database: {}. Keeping previously loaded database.",
                                    e
                                );
                            }
                            Err(e) => {
                                stats.increment(Outcome::RefreshFailure);
                                log::error!("Database refresh task failed: {}", e);
                            }
                        }
                    }
                    _ = task_shutdown.cancelled() => {
                        log::debug!("Database refresh task shutting down");
                        break;
                    }
                }
            }
        });

        RefreshTimer {
            period,
            shutdown,
            handle: Mutex::new(Some(handle)),
        }
    }

    /// Refresh period.
    pub fn period(&self) -> Duration {
        self.period
    }

    /// Stops the refresh task. Idempotent.
    pub fn stop(&self) {
        if !self.shutdown.is_cancelled() {
            self.shutdown.cancel();
            log::info!("Database refresh timer stopped");
        }
    }

    /// Stops the refresh task and waits for it to exit.
    pub async fn shutdown(&self) {
        self.stop();
        let handle = self
            .handle
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }
    }

    /// Whether the refresh task is still running.
    pub fn is_running(&self) -> bool {
        self.handle
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .as_ref()
            .is_some_and(|h| !h.is_finished())
    }
}

impl Drop for RefreshTimer {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}
