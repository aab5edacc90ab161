//! Job progress tracking.
//!
//! The [`ProgressTracker`] keeps the latest [`ProgressSnapshot`] of every
//! job and relays new snapshots to at most one live observer per job.

mod tracker;
mod types;

pub use tracker::{ProgressSubscription, ProgressTracker};
pub use types::{
    ErrorDetails, JobStatus, ProgressSnapshot, PROCESSING_ERROR_CODE, PROCESSING_ERROR_MESSAGE,
};
