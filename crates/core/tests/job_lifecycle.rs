//! Job lifecycle integration tests.
//!
//! These tests drive the orchestrator end to end with scripted strategies:
//! submit -> processing -> completed | failed

use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;

use docforge_core::{
    testing::{fixtures, MockCompressionStrategy, MockConversionStrategy, MockOutcome},
    CompressionLevel, CompressionRequest, ConversionRequest, FileFormat, JobOrchestrator,
    JobStatus, JobsConfig, ProgressSnapshot, ProgressTracker, StorageConfig, StorageManager,
    StrategyRegistry, UploadConfig, ValidationError,
};

/// Test helper owning the orchestrator and its storage roots.
struct TestHarness {
    orchestrator: JobOrchestrator,
    _temp_dir: TempDir,
}

impl TestHarness {
    async fn new(registry: StrategyRegistry) -> Self {
        Self::with_jobs(registry, JobsConfig::default()).await
    }

    async fn with_jobs(registry: StrategyRegistry, jobs: JobsConfig) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let config = StorageConfig::with_dirs(
            temp_dir.path().join("originals"),
            temp_dir.path().join("processed"),
        );
        let storage = StorageManager::init(&config)
            .await
            .expect("Failed to init storage");

        let orchestrator = JobOrchestrator::new(
            Arc::new(storage),
            Arc::new(registry),
            Arc::new(ProgressTracker::new()),
            &jobs,
            &UploadConfig::default(),
        );

        Self {
            orchestrator,
            _temp_dir: temp_dir,
        }
    }

    fn tracker(&self) -> &ProgressTracker {
        self.orchestrator.tracker()
    }

    fn originals_count(&self) -> usize {
        std::fs::read_dir(self.orchestrator.storage().originals_root())
            .unwrap()
            .count()
    }

    fn processed_count(&self) -> usize {
        std::fs::read_dir(self.orchestrator.storage().processed_root())
            .unwrap()
            .count()
    }

    /// Wait for the job to reach a terminal state.
    async fn wait_for_terminal(&self, job_id: &str, timeout: Duration) -> ProgressSnapshot {
        let start = std::time::Instant::now();
        loop {
            if let Some(snapshot) = self.tracker().get_snapshot(job_id) {
                if snapshot.is_terminal() {
                    return snapshot;
                }
            }
            if start.elapsed() > timeout {
                panic!("Timeout waiting for job {} to finish", job_id);
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }
}

fn compress(name: &str, level: i64) -> CompressionRequest {
    CompressionRequest {
        file: Some(fixtures::upload(name)),
        compression_level: Some(level),
    }
}

fn convert(name: &str, target: &str) -> ConversionRequest {
    ConversionRequest {
        file: Some(fixtures::upload(name)),
        target_format: Some(target.to_string()),
    }
}

#[tokio::test]
async fn test_compression_at_level_50_completes() {
    let pdf = MockCompressionStrategy::new("pdf").supporting(FileFormat::Pdf);
    let harness =
        TestHarness::new(StrategyRegistry::new().with_compression(Arc::new(pdf.clone()))).await;

    let ack = harness
        .orchestrator
        .submit_compression(compress("report.pdf", 50))
        .await
        .unwrap();
    assert_eq!(ack.status, JobStatus::Processing);
    assert_eq!(ack.file_name, "report_compressed.pdf");
    assert_eq!(ack.download_url, format!("/api/v1/download/{}", ack.file_id));

    let done = harness
        .wait_for_terminal(&ack.job_id, Duration::from_secs(5))
        .await;
    assert_eq!(done.status, JobStatus::Completed);
    assert_eq!(done.progress, 100);
    assert!(done.error.is_none());

    let calls = pdf.recorded().await;
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].level, Some(CompressionLevel::Medium));
    assert_eq!(calls[0].source_bytes, b"contents of report.pdf");
}

#[tokio::test]
async fn test_unknown_target_format_creates_nothing() {
    let image = MockConversionStrategy::new("image").supporting(FileFormat::Jpg, FileFormat::Png);
    let harness =
        TestHarness::new(StrategyRegistry::new().with_conversion(Arc::new(image.clone()))).await;

    let err = harness
        .orchestrator
        .submit_conversion(convert("photo.jpg", "xyz"))
        .await
        .unwrap_err();

    assert_eq!(err.code(), "VALIDATION_ERROR");
    assert!(matches!(
        err,
        docforge_core::JobError::Validation(ValidationError::InvalidTargetFormat(_))
    ));
    assert_eq!(harness.tracker().tracked_jobs(), 0);
    assert_eq!(harness.originals_count(), 0);
    assert_eq!(harness.processed_count(), 0);
    assert_eq!(image.call_count().await, 0);
}

#[tokio::test]
async fn test_failed_strategy_reports_detail() {
    let docx = MockCompressionStrategy::new("docx").supporting(FileFormat::Docx);
    docx.set_outcome(MockOutcome::Fail("corrupt archive".into()))
        .await;
    let harness =
        TestHarness::new(StrategyRegistry::new().with_compression(Arc::new(docx))).await;

    let ack = harness
        .orchestrator
        .submit_compression(compress("memo.docx", 10))
        .await
        .unwrap();

    let done = harness
        .wait_for_terminal(&ack.job_id, Duration::from_secs(5))
        .await;
    assert_eq!(done.status, JobStatus::Failed);
    assert_eq!(done.progress, 100);
    let error = done.error.unwrap();
    assert_eq!(error.code, "PROCESSING_ERROR");
    assert_eq!(error.message, "File processing failed");
    assert_eq!(error.details.as_deref(), Some("docx failed: corrupt archive"));
}

#[tokio::test]
async fn test_terminal_state_is_idempotent() {
    let png = MockCompressionStrategy::new("png").supporting(FileFormat::Png);
    let harness =
        TestHarness::new(StrategyRegistry::new().with_compression(Arc::new(png))).await;

    let ack = harness
        .orchestrator
        .submit_compression(compress("a.png", 80))
        .await
        .unwrap();
    let done = harness
        .wait_for_terminal(&ack.job_id, Duration::from_secs(5))
        .await;

    harness.tracker().update(&ack.job_id, 10);
    harness.tracker().mark_failed(&ack.job_id, "late failure");

    assert_eq!(harness.tracker().get_snapshot(&ack.job_id), Some(done));
}

#[tokio::test]
async fn test_concurrent_jobs_are_isolated() {
    let good = MockCompressionStrategy::new("jpg").supporting(FileFormat::Jpg);
    good.set_step_delay(Duration::from_millis(5)).await;
    let bad = MockCompressionStrategy::new("png").supporting(FileFormat::Png);
    bad.set_outcome(MockOutcome::Fail("broken".into())).await;

    let registry = StrategyRegistry::new()
        .with_compression(Arc::new(good))
        .with_compression(Arc::new(bad));
    let harness = TestHarness::with_jobs(
        registry,
        JobsConfig::default().with_max_concurrent_jobs(8),
    )
    .await;

    let mut acks = Vec::new();
    for i in 0..10 {
        let name = if i % 2 == 0 {
            format!("img{i}.jpg")
        } else {
            format!("img{i}.png")
        };
        let ack = harness
            .orchestrator
            .submit_compression(compress(&name, 40))
            .await
            .unwrap();
        acks.push((i, ack));
    }

    let ids: std::collections::HashSet<_> = acks.iter().map(|(_, a)| a.job_id.clone()).collect();
    assert_eq!(ids.len(), 10);

    for (i, ack) in &acks {
        let done = harness
            .wait_for_terminal(&ack.job_id, Duration::from_secs(5))
            .await;
        assert_eq!(done.job_id, ack.job_id);
        if i % 2 == 0 {
            assert_eq!(done.status, JobStatus::Completed, "job {i}");
            assert!(done.error.is_none());
        } else {
            assert_eq!(done.status, JobStatus::Failed, "job {i}");
            assert_eq!(
                done.error.unwrap().details.as_deref(),
                Some("png failed: broken")
            );
        }
    }

    let status = harness.orchestrator.status();
    assert_eq!(status.total_completed, 5);
    assert_eq!(status.total_failed, 5);
}

#[tokio::test]
async fn test_subscriber_sees_ordered_progress_then_closes() {
    let jpg = MockConversionStrategy::new("image").supporting(FileFormat::Png, FileFormat::Jpg);
    jpg.set_progress_steps(vec![10, 40, 70, 100]).await;
    jpg.set_step_delay(Duration::from_millis(20)).await;
    let harness =
        TestHarness::new(StrategyRegistry::new().with_conversion(Arc::new(jpg))).await;

    let ack = harness
        .orchestrator
        .submit_conversion(convert("diagram.png", "JPG"))
        .await
        .unwrap();
    let mut subscription = harness.tracker().subscribe(&ack.job_id);

    let mut seen = Vec::new();
    while let Some(snapshot) = subscription.recv().await {
        seen.push(snapshot);
    }

    let progress: Vec<u8> = seen.iter().map(|s| s.progress).collect();
    assert!(progress.windows(2).all(|w| w[0] <= w[1]), "{progress:?}");
    let last = seen.last().unwrap();
    assert_eq!(last.status, JobStatus::Completed);
    assert_eq!(last.progress, 100);
}

#[tokio::test]
async fn test_subscribe_before_job_exists() {
    let harness = TestHarness::new(StrategyRegistry::new()).await;

    let mut subscription = harness.tracker().subscribe("not-yet-submitted");
    {
        let mut next = tokio_test::task::spawn(subscription.recv());
        tokio_test::assert_pending!(next.poll());
    }
    assert!(harness.tracker().get_snapshot("not-yet-submitted").is_none());

    harness.tracker().update("not-yet-submitted", 30);
    let snapshot = subscription.recv().await.unwrap();
    assert_eq!(snapshot.progress, 30);
    assert_eq!(snapshot.status, JobStatus::Processing);
}

#[tokio::test]
async fn test_first_registered_strategy_wins() {
    let first = MockConversionStrategy::new("first").supporting(FileFormat::Docx, FileFormat::Pdf);
    let second =
        MockConversionStrategy::new("second").supporting(FileFormat::Docx, FileFormat::Pdf);
    let registry = StrategyRegistry::new()
        .with_conversion(Arc::new(first.clone()))
        .with_conversion(Arc::new(second.clone()));
    let harness = TestHarness::new(registry).await;

    for _ in 0..3 {
        let ack = harness
            .orchestrator
            .submit_conversion(convert("letter.docx", "pdf"))
            .await
            .unwrap();
        harness
            .wait_for_terminal(&ack.job_id, Duration::from_secs(5))
            .await;
    }

    assert_eq!(first.call_count().await, 3);
    assert_eq!(second.call_count().await, 0);
}

#[tokio::test]
async fn test_same_name_uploads_do_not_collide() {
    let pdf = MockCompressionStrategy::new("pdf").supporting(FileFormat::Pdf);
    let harness =
        TestHarness::new(StrategyRegistry::new().with_compression(Arc::new(pdf))).await;

    let first = harness
        .orchestrator
        .submit_compression(compress("same.pdf", 50))
        .await
        .unwrap();
    let second = harness
        .orchestrator
        .submit_compression(compress("same.pdf", 50))
        .await
        .unwrap();

    assert_ne!(first.file_id, second.file_id);
    for ack in [&first, &second] {
        harness
            .wait_for_terminal(&ack.job_id, Duration::from_secs(5))
            .await;
    }
    assert_eq!(harness.originals_count(), 2);
    assert_eq!(harness.processed_count(), 2);
}
