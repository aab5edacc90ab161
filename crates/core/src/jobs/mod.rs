//! Job submission and background execution.
//!
//! The [`JobOrchestrator`] turns a validated request into a [`Job`]: it
//! stages the original and an output placeholder through the storage
//! manager, picks a strategy from the registry, and runs it on a bounded
//! worker pool while progress flows into the tracker.

mod config;
mod error;
mod orchestrator;
mod types;
mod validation;

pub use config::{JobsConfig, UploadConfig};
pub use error::JobError;
pub use orchestrator::JobOrchestrator;
pub use types::{Job, JobAcknowledgment, JobOperation, OrchestratorStatus, DOWNLOAD_PATH_PREFIX};
pub use validation::{
    CompressionRequest, ConversionRequest, RequestValidator, UploadedFile, ValidCompression,
    ValidConversion, ValidationError,
};
