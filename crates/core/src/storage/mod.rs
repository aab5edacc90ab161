//! On-disk artifact storage.
//!
//! Originals and processed outputs live in two flat directories. The
//! [`StorageManager`] is the only component that touches them, and the
//! [`CleanupScheduler`] removes what has outlived its retention.

mod config;
mod error;
mod manager;
mod sweeper;
mod types;

pub use config::StorageConfig;
pub use error::StorageError;
pub use manager::StorageManager;
pub use sweeper::CleanupScheduler;
pub use types::{Artifact, ArtifactKind, SweepReport};
