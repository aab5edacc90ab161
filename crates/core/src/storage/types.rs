//! Types for the storage module.

use serde::Serialize;
use std::path::PathBuf;

/// Which root an artifact lives under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    /// Caller-supplied input, staged at submission.
    Original,
    /// Strategy output, allocated as an empty placeholder before execution.
    Processed,
}

/// A file on one of the storage roots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub kind: ArtifactKind,
    /// Name within its root. May differ from the requested name after
    /// collision disambiguation.
    pub file_name: String,
    /// Absolute path.
    pub path: PathBuf,
}

/// Outcome of one sweep over both roots.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    /// Entries inspected.
    pub scanned: usize,
    /// Entries removed.
    pub deleted: usize,
    /// Entries that were eligible but could not be removed or inspected.
    pub failed: usize,
}

impl SweepReport {
    pub(crate) fn merge(&mut self, other: SweepReport) {
        self.scanned += other.scanned;
        self.deleted += other.deleted;
        self.failed += other.failed;
    }
}
