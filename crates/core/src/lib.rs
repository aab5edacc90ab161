//! Job orchestration and progress streaming for document and image
//! conversion and compression.

pub mod config;
pub mod format;
pub mod jobs;
pub mod metrics;
pub mod progress;
pub mod storage;
pub mod strategy;
pub mod testing;

pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, SanitizedConfig,
    ServerConfig,
};
pub use format::{CompressionLevel, FileFormat, UnknownFormat, DEFAULT_COMPRESSION_LEVEL};
pub use jobs::{
    CompressionRequest, ConversionRequest, JobAcknowledgment, JobError, JobOperation,
    JobOrchestrator, JobsConfig, OrchestratorStatus, UploadConfig, UploadedFile,
    ValidationError, DOWNLOAD_PATH_PREFIX,
};
pub use progress::{
    ErrorDetails, JobStatus, ProgressSnapshot, ProgressSubscription, ProgressTracker,
};
pub use storage::{
    Artifact, ArtifactKind, CleanupScheduler, StorageConfig, StorageError, StorageManager,
    SweepReport,
};
pub use strategy::{
    CompressionStrategy, ConversionStrategy, ProcessingError, ProgressSink, StrategyRegistry,
    ToolsConfig,
};
