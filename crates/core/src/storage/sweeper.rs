//! Recurring cleanup of expired artifacts and stale progress entries.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{info, warn};

use super::config::StorageConfig;
use super::manager::StorageManager;
use super::types::SweepReport;
use crate::progress::ProgressTracker;

/// Runs the expiry sweep on a timer.
///
/// The first cycle runs `initial_delay` after [`start`](Self::start), then
/// every `interval`. Each cycle sweeps both storage roots and evicts
/// finished jobs from the tracker.
pub struct CleanupScheduler {
    storage: Arc<StorageManager>,
    tracker: Arc<ProgressTracker>,
    max_age: Duration,
    interval: Duration,
    initial_delay: Duration,
    snapshot_retention: Duration,
    running: Arc<AtomicBool>,
    shutdown_tx: broadcast::Sender<()>,
}

impl CleanupScheduler {
    pub fn new(
        storage: Arc<StorageManager>,
        tracker: Arc<ProgressTracker>,
        config: &StorageConfig,
        snapshot_retention: Duration,
    ) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);
        Self {
            storage,
            tracker,
            max_age: config.max_age(),
            interval: config.sweep_interval(),
            initial_delay: config.initial_sweep_delay(),
            snapshot_retention,
            running: Arc::new(AtomicBool::new(false)),
            shutdown_tx,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    /// Runs one cleanup cycle now.
    pub async fn run_once(&self) -> SweepReport {
        Self::cycle(&self.storage, &self.tracker, self.max_age, self.snapshot_retention).await
    }

    async fn cycle(
        storage: &StorageManager,
        tracker: &ProgressTracker,
        max_age: Duration,
        snapshot_retention: Duration,
    ) -> SweepReport {
        let report = storage.sweep_expired(max_age).await;
        if report.failed > 0 {
            warn!(failed = report.failed, "Some expired files could not be deleted");
        }
        tracker.evict_terminal(snapshot_retention);
        report
    }

    /// Spawns the cleanup loop.
    pub fn start(&self) {
        if self.running.swap(true, Ordering::SeqCst) {
            warn!("Cleanup scheduler already running");
            return;
        }

        let running = Arc::clone(&self.running);
        let storage = Arc::clone(&self.storage);
        let tracker = Arc::clone(&self.tracker);
        let max_age = self.max_age;
        let interval = self.interval;
        let retention = self.snapshot_retention;
        let mut delay = self.initial_delay;
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        tokio::spawn(async move {
            info!(
                max_age_secs = max_age.as_secs(),
                interval_secs = interval.as_secs(),
                "Cleanup loop started"
            );
            loop {
                tokio::select! {
                    _ = shutdown_rx.recv() => {
                        info!("Cleanup loop received shutdown signal");
                        break;
                    }
                    _ = tokio::time::sleep(delay) => {
                        if !running.load(Ordering::Relaxed) {
                            break;
                        }
                        Self::cycle(&storage, &tracker, max_age, retention).await;
                        delay = interval;
                    }
                }
            }
            info!("Cleanup loop stopped");
        });
    }

    /// Signals the loop to stop.
    pub fn stop(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            return;
        }
        let _ = self.shutdown_tx.send(());
    }
}
