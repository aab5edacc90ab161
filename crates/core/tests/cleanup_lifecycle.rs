//! Expiry sweep integration tests.

use std::fs::File;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use tempfile::TempDir;

use docforge_core::{
    CleanupScheduler, ProgressTracker, StorageConfig, StorageManager,
};

fn set_age(path: &Path, age: Duration) {
    let file = File::options().write(true).open(path).unwrap();
    file.set_modified(SystemTime::now() - age).unwrap();
}

async fn storage(dir: &TempDir) -> (Arc<StorageManager>, StorageConfig) {
    let config = StorageConfig::with_dirs(
        dir.path().join("originals"),
        dir.path().join("processed"),
    )
    .with_max_age(3600);
    let storage = StorageManager::init(&config).await.unwrap();
    (Arc::new(storage), config)
}

#[tokio::test]
async fn test_sweep_keeps_fresh_and_removes_stale() {
    let dir = TempDir::new().unwrap();
    let (storage, config) = storage(&dir).await;

    let stale_original = storage.store_original(b"a", "stale.pdf").await.unwrap();
    let stale_output = storage.allocate_processed("stale_compressed.pdf").await.unwrap();
    let fresh_original = storage.store_original(b"b", "fresh.pdf").await.unwrap();
    set_age(&stale_original.path, Duration::from_secs(7200));
    set_age(&stale_output.path, Duration::from_secs(7200));

    let report = storage.sweep_expired(config.max_age()).await;

    assert_eq!(report.scanned, 3);
    assert_eq!(report.deleted, 2);
    assert_eq!(report.failed, 0);
    assert!(!stale_original.path.exists());
    assert!(!stale_output.path.exists());
    assert!(fresh_original.path.exists());
}

#[tokio::test]
async fn test_sweep_against_future_clock_removes_everything() {
    let dir = TempDir::new().unwrap();
    let (storage, config) = storage(&dir).await;

    for name in ["a.jpg", "b.png", "c.docx"] {
        storage.store_original(b"x", name).await.unwrap();
    }

    let later = SystemTime::now() + Duration::from_secs(2 * 3600);
    let report = storage.sweep_expired_at(config.max_age(), later).await;
    assert_eq!(report.deleted, 3);
    assert_eq!(
        std::fs::read_dir(storage.originals_root()).unwrap().count(),
        0
    );
}

#[tokio::test]
async fn test_scheduler_cycle_evicts_finished_jobs() {
    let dir = TempDir::new().unwrap();
    let (storage, config) = storage(&dir).await;
    let tracker = Arc::new(ProgressTracker::new());

    tracker.update("running", 40);
    tracker.mark_completed("done");
    tracker.mark_failed("broken", "gs failed");

    let scheduler = CleanupScheduler::new(storage, Arc::clone(&tracker), &config, Duration::ZERO);
    scheduler.run_once().await;

    assert!(tracker.get_snapshot("running").is_some());
    assert!(tracker.get_snapshot("done").is_none());
    assert!(tracker.get_snapshot("broken").is_none());
}

#[tokio::test]
async fn test_scheduler_stop_is_idempotent() {
    let dir = TempDir::new().unwrap();
    let (storage, config) = storage(&dir).await;
    let scheduler = CleanupScheduler::new(
        storage,
        Arc::new(ProgressTracker::new()),
        &config,
        Duration::from_secs(60),
    );

    scheduler.start();
    scheduler.start();
    assert!(scheduler.is_running());
    scheduler.stop();
    scheduler.stop();
    assert!(!scheduler.is_running());
}
