//! Job orchestrator: accepts submissions and runs them in the background.

use chrono::Utc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::config::{JobsConfig, UploadConfig};
use super::error::JobError;
use super::types::{Job, JobAcknowledgment, JobOperation, OrchestratorStatus};
use super::validation::{CompressionRequest, ConversionRequest, RequestValidator, UploadedFile};
use crate::format::{compressed_file_name, converted_file_name, CompressionLevel};
use crate::metrics::{JOBS_FINISHED, JOBS_REJECTED, JOBS_SUBMITTED, JOB_DURATION};
use crate::progress::ProgressTracker;
use crate::storage::StorageManager;
use crate::strategy::{
    CompressionStrategy, ConversionStrategy, ProcessingError, ProgressSink, StrategyRegistry,
};

/// Tracks statistics for the worker pool.
#[derive(Default)]
struct PoolStats {
    active: AtomicU64,
    queued: AtomicU64,
    total_completed: AtomicU64,
    total_failed: AtomicU64,
}

/// Resolved strategy plus what it needs beyond the two paths.
enum Transform {
    Convert(Arc<dyn ConversionStrategy>),
    Compress(Arc<dyn CompressionStrategy>, CompressionLevel),
}

impl Transform {
    fn strategy_name(&self) -> &str {
        match self {
            Self::Convert(s) => s.name(),
            Self::Compress(s, _) => s.name(),
        }
    }
}

/// Entry point for conversion and compression jobs.
///
/// A submission is validated, its strategy resolved, and its original and
/// output placeholder staged before it returns. The transform itself runs
/// on a spawned task bounded by a worker pool; its outcome only becomes
/// visible through the [`ProgressTracker`].
pub struct JobOrchestrator {
    storage: Arc<StorageManager>,
    registry: Arc<StrategyRegistry>,
    tracker: Arc<ProgressTracker>,
    validator: RequestValidator,
    semaphore: Arc<Semaphore>,
    max_concurrent: usize,
    stats: Arc<PoolStats>,
}

impl JobOrchestrator {
    /// Creates an orchestrator over the given collaborators.
    pub fn new(
        storage: Arc<StorageManager>,
        registry: Arc<StrategyRegistry>,
        tracker: Arc<ProgressTracker>,
        jobs: &JobsConfig,
        upload: &UploadConfig,
    ) -> Self {
        let max_concurrent = jobs.max_concurrent_jobs.max(1);
        Self {
            storage,
            registry,
            tracker,
            validator: RequestValidator::new(upload.max_file_size_bytes),
            semaphore: Arc::new(Semaphore::new(max_concurrent)),
            max_concurrent,
            stats: Arc::new(PoolStats::default()),
        }
    }

    pub fn tracker(&self) -> &Arc<ProgressTracker> {
        &self.tracker
    }

    pub fn storage(&self) -> &Arc<StorageManager> {
        &self.storage
    }

    pub fn registry(&self) -> &Arc<StrategyRegistry> {
        &self.registry
    }

    /// Submits a format conversion.
    pub async fn submit_conversion(
        &self,
        request: ConversionRequest,
    ) -> Result<JobAcknowledgment, JobError> {
        let result = self.try_submit_conversion(request).await;
        Self::record_rejection("conversion", &result);
        result
    }

    /// Submits a compression.
    pub async fn submit_compression(
        &self,
        request: CompressionRequest,
    ) -> Result<JobAcknowledgment, JobError> {
        let result = self.try_submit_compression(request).await;
        Self::record_rejection("compression", &result);
        result
    }

    async fn try_submit_conversion(
        &self,
        request: ConversionRequest,
    ) -> Result<JobAcknowledgment, JobError> {
        let valid = self.validator.validate_conversion(request)?;
        let strategy = self
            .registry
            .resolve_conversion(valid.source, valid.target)
            .ok_or_else(|| JobError::unsupported_conversion(valid.source, valid.target))?;

        let output_name = converted_file_name(&valid.file.file_name, valid.target);
        let operation = JobOperation::Conversion {
            source: valid.source,
            target: valid.target,
        };
        self.accept(valid.file, output_name, operation, Transform::Convert(strategy))
            .await
    }

    async fn try_submit_compression(
        &self,
        request: CompressionRequest,
    ) -> Result<JobAcknowledgment, JobError> {
        let valid = self.validator.validate_compression(request)?;
        let strategy = self
            .registry
            .resolve_compression(valid.format)
            .ok_or_else(|| JobError::unsupported_compression(valid.format))?;

        let output_name = compressed_file_name(&valid.file.file_name);
        let operation = JobOperation::Compression {
            format: valid.format,
            level: valid.level,
        };
        self.accept(
            valid.file,
            output_name,
            operation,
            Transform::Compress(strategy, valid.level),
        )
        .await
    }

    fn record_rejection(operation: &str, result: &Result<JobAcknowledgment, JobError>) {
        if let Err(e) = result {
            debug!(operation, code = e.code(), "Submission rejected: {}", e);
            JOBS_REJECTED
                .with_label_values(&[operation, e.code()])
                .inc();
        }
    }

    /// Stages artifacts, records the initial snapshot, and launches the task.
    async fn accept(
        &self,
        file: UploadedFile,
        output_name: String,
        operation: JobOperation,
        transform: Transform,
    ) -> Result<JobAcknowledgment, JobError> {
        let job_id = Uuid::new_v4().to_string();

        let original = self
            .storage
            .store_original(&file.data, &file.file_name)
            .await?;
        let output = match self.storage.allocate_processed(&output_name).await {
            Ok(output) => output,
            Err(e) => {
                self.storage.discard(&original).await;
                return Err(e.into());
            }
        };

        let job = Job {
            id: job_id,
            operation,
            original,
            output,
            file_size: file.data.len() as u64,
            submitted_at: Utc::now(),
        };
        let ack = JobAcknowledgment::for_job(&job);

        self.tracker.update(&job.id, 0);
        JOBS_SUBMITTED
            .with_label_values(&[operation.label()])
            .inc();
        info!(
            job_id = %job.id,
            operation = operation.label(),
            strategy = transform.strategy_name(),
            source = %job.original.file_name,
            output = %job.output.file_name,
            "Job accepted"
        );

        self.launch(job, transform);
        Ok(ack)
    }

    fn launch(&self, job: Job, transform: Transform) {
        let tracker = Arc::clone(&self.tracker);
        let semaphore = Arc::clone(&self.semaphore);
        let stats = Arc::clone(&self.stats);

        stats.queued.fetch_add(1, Ordering::Relaxed);
        tokio::spawn(async move {
            let permit = semaphore.acquire_owned().await;
            stats.queued.fetch_sub(1, Ordering::Relaxed);
            let _permit = match permit {
                Ok(permit) => permit,
                Err(_) => {
                    tracker.mark_failed(&job.id, "Worker pool is closed");
                    stats.total_failed.fetch_add(1, Ordering::Relaxed);
                    return;
                }
            };

            stats.active.fetch_add(1, Ordering::Relaxed);
            debug!(job_id = %job.id, "Job started");
            let start = Instant::now();

            let outcome = run_transform(&job, transform, &tracker).await;

            stats.active.fetch_sub(1, Ordering::Relaxed);
            let label = job.operation.label();
            let result = match outcome {
                Ok(()) => {
                    tracker.mark_completed(&job.id);
                    stats.total_completed.fetch_add(1, Ordering::Relaxed);
                    info!(
                        job_id = %job.id,
                        output = %job.output.file_name,
                        elapsed_ms = start.elapsed().as_millis() as u64,
                        "Job completed"
                    );
                    "completed"
                }
                Err(e) => {
                    let detail = e.detail();
                    warn!(job_id = %job.id, operation = label, "Job failed: {}", detail);
                    tracker.mark_failed(&job.id, detail);
                    stats.total_failed.fetch_add(1, Ordering::Relaxed);
                    "failed"
                }
            };

            JOBS_FINISHED.with_label_values(&[label, result]).inc();
            JOB_DURATION
                .with_label_values(&[label, result])
                .observe(start.elapsed().as_secs_f64());
        });
    }

    /// Returns the worker pool status.
    pub fn status(&self) -> OrchestratorStatus {
        OrchestratorStatus {
            active_jobs: self.stats.active.load(Ordering::Relaxed) as usize,
            queued_jobs: self.stats.queued.load(Ordering::Relaxed) as usize,
            max_concurrent: self.max_concurrent,
            total_completed: self.stats.total_completed.load(Ordering::Relaxed),
            total_failed: self.stats.total_failed.load(Ordering::Relaxed),
            active_observers: self.tracker.active_observers(),
            tracked_jobs: self.tracker.tracked_jobs(),
            conversion_strategies: self.registry.conversion_names(),
            compression_strategies: self.registry.compression_names(),
        }
    }
}

/// Runs the strategy on its own task and relays its progress to the
/// tracker. A panic inside the strategy surfaces as `Aborted`.
async fn run_transform(
    job: &Job,
    transform: Transform,
    tracker: &ProgressTracker,
) -> Result<(), ProcessingError> {
    let (sink, mut progress) = ProgressSink::channel();
    let source = job.original.path.clone();
    let target = job.output.path.clone();

    let mut work = tokio::spawn(async move {
        match transform {
            Transform::Convert(strategy) => strategy.convert(&source, &target, sink).await,
            Transform::Compress(strategy, level) => {
                strategy.compress(&source, &target, level, sink).await
            }
        }
    });

    let joined = loop {
        tokio::select! {
            biased;
            Some(percent) = progress.recv() => tracker.update(&job.id, percent),
            joined = &mut work => break joined,
        }
    };
    while let Ok(percent) = progress.try_recv() {
        tracker.update(&job.id, percent);
    }

    match joined {
        Ok(result) => result,
        Err(e) if e.is_panic() => Err(ProcessingError::Aborted {
            reason: "transform panicked".to_string(),
        }),
        Err(e) => Err(ProcessingError::Aborted {
            reason: e.to_string(),
        }),
    }
}

impl std::fmt::Debug for JobOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobOrchestrator")
            .field("registry", &self.registry)
            .field("max_concurrent", &self.max_concurrent)
            .finish()
    }
}
