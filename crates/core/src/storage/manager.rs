//! File system storage manager.

use std::fs as std_fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::time::{Duration, SystemTime};

use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::{debug, error, info, warn};

use super::config::StorageConfig;
use super::error::StorageError;
use super::types::{Artifact, ArtifactKind, SweepReport};
use crate::metrics::{SWEEP_DELETED, SWEEP_FAILED};

/// Attempts at finding a free name before giving up.
const MAX_NAME_ATTEMPTS: usize = 8;

/// Owns the originals/processed directory pair.
///
/// Every name handed in is resolved against its root and rejected unless it
/// is a single plain path component, so nothing is ever read or written
/// outside the configured directories. Existing files are never overwritten:
/// a colliding name gets a random suffix before the extension.
#[derive(Debug, Clone)]
pub struct StorageManager {
    originals_root: PathBuf,
    processed_root: PathBuf,
}

impl StorageManager {
    /// Creates both roots (if missing) and returns a manager bound to their
    /// canonical paths.
    pub async fn init(config: &StorageConfig) -> Result<Self, StorageError> {
        let originals_root = Self::prepare_root(&config.originals_dir).await?;
        let processed_root = Self::prepare_root(&config.processed_dir).await?;

        info!(
            originals = %originals_root.display(),
            processed = %processed_root.display(),
            "Storage roots ready"
        );

        Ok(Self {
            originals_root,
            processed_root,
        })
    }

    async fn prepare_root(dir: &Path) -> Result<PathBuf, StorageError> {
        fs::create_dir_all(dir)
            .await
            .map_err(|e| StorageError::DirectoryCreationFailed {
                path: dir.to_path_buf(),
                source: e,
            })?;
        fs::canonicalize(dir)
            .await
            .map_err(|e| StorageError::io(dir, e))
    }

    /// Root holding originals.
    pub fn originals_root(&self) -> &Path {
        &self.originals_root
    }

    /// Root holding processed output.
    pub fn processed_root(&self) -> &Path {
        &self.processed_root
    }

    /// Stages caller-supplied bytes under the originals root.
    pub async fn store_original(
        &self,
        data: &[u8],
        suggested_name: &str,
    ) -> Result<Artifact, StorageError> {
        if data.is_empty() {
            return Err(StorageError::EmptyInput {
                name: suggested_name.to_string(),
            });
        }

        let (file_name, path, mut file) =
            create_unique(&self.originals_root, suggested_name).await?;

        let written = async {
            file.write_all(data).await?;
            file.flush().await
        }
        .await;

        if let Err(e) = written {
            error!(path = %path.display(), "Failed to write original: {}", e);
            // Do not leave a truncated original behind.
            let _ = fs::remove_file(&path).await;
            return Err(StorageError::io(&path, e));
        }

        info!(file = %file_name, bytes = data.len(), "Stored original file");
        Ok(Artifact {
            kind: ArtifactKind::Original,
            file_name,
            path,
        })
    }

    /// Creates an empty placeholder under the processed root.
    ///
    /// The placeholder lets downloads tell "in progress" apart from
    /// "not found" before the strategy has written anything.
    pub async fn allocate_processed(&self, file_name: &str) -> Result<Artifact, StorageError> {
        let (file_name, path, _file) = create_unique(&self.processed_root, file_name).await?;

        info!(file = %file_name, "Created processed file");
        Ok(Artifact {
            kind: ArtifactKind::Processed,
            file_name,
            path,
        })
    }

    /// Looks up a processed artifact by its file id.
    pub async fn open_processed(&self, file_id: &str) -> Result<Artifact, StorageError> {
        let path = resolve_within(&self.processed_root, file_id)?;

        match fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => Ok(Artifact {
                kind: ArtifactKind::Processed,
                file_name: file_id.to_string(),
                path,
            }),
            Ok(_) => Err(StorageError::NotFound {
                name: file_id.to_string(),
            }),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Err(StorageError::NotFound {
                name: file_id.to_string(),
            }),
            Err(e) => Err(StorageError::io(path, e)),
        }
    }

    /// Best-effort removal of an artifact. Missing files are not an error.
    pub async fn discard(&self, artifact: &Artifact) {
        match fs::remove_file(&artifact.path).await {
            Ok(()) => debug!(file = %artifact.file_name, "Discarded artifact"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => warn!(file = %artifact.file_name, "Failed to discard artifact: {}", e),
        }
    }

    /// Removes every entry in both roots last modified more than `max_age` ago.
    pub async fn sweep_expired(&self, max_age: Duration) -> SweepReport {
        self.sweep_expired_at(max_age, SystemTime::now()).await
    }

    /// Same as [`sweep_expired`](Self::sweep_expired) against an explicit clock.
    pub async fn sweep_expired_at(&self, max_age: Duration, now: SystemTime) -> SweepReport {
        let roots = [self.originals_root.clone(), self.processed_root.clone()];

        let result = tokio::task::spawn_blocking(move || {
            let Some(cutoff) = now.checked_sub(max_age) else {
                return SweepReport::default();
            };
            let mut report = SweepReport::default();
            for root in &roots {
                report.merge(sweep_dir(root, cutoff, &remove_entry));
            }
            report
        })
        .await;

        match result {
            Ok(report) => {
                SWEEP_DELETED.inc_by(report.deleted as u64);
                SWEEP_FAILED.inc_by(report.failed as u64);
                info!(
                    scanned = report.scanned,
                    deleted = report.deleted,
                    failed = report.failed,
                    "Cleaned up old files"
                );
                report
            }
            Err(e) => {
                error!("Cleanup sweep aborted: {}", e);
                SweepReport::default()
            }
        }
    }
}

/// Resolves `name` inside `root`, rejecting anything that is not a single
/// normal path component.
pub(crate) fn resolve_within(root: &Path, name: &str) -> Result<PathBuf, StorageError> {
    let violation = || StorageError::PathViolation {
        name: name.to_string(),
    };

    if name.is_empty() || name.contains(&['/', '\\', '\0'][..]) {
        return Err(violation());
    }

    let candidate = Path::new(name);
    let mut components = candidate.components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => {}
        _ => return Err(violation()),
    }

    let resolved = root.join(candidate);
    if resolved.parent() != Some(root) {
        return Err(violation());
    }
    Ok(resolved)
}

/// Creates a new file under `root`, never clobbering an existing one.
async fn create_unique(
    root: &Path,
    requested: &str,
) -> Result<(String, PathBuf, fs::File), StorageError> {
    // Validate the caller's name before touching the file system.
    resolve_within(root, requested)?;

    let mut name = requested.to_string();
    for _ in 0..MAX_NAME_ATTEMPTS {
        let path = resolve_within(root, &name)?;
        match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
        {
            Ok(file) => return Ok((name, path, file)),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                debug!(file = %name, "Name taken, disambiguating");
                name = disambiguate(requested);
            }
            Err(e) => return Err(StorageError::io(path, e)),
        }
    }

    Err(StorageError::NameExhausted {
        name: requested.to_string(),
    })
}

/// Inserts a short random tag before the extension: `a.pdf` -> `a-1f2e3d4c.pdf`.
fn disambiguate(name: &str) -> String {
    let tag = uuid::Uuid::new_v4().simple().to_string();
    let tag = &tag[..8];
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => format!("{}-{}.{}", stem, tag, ext),
        _ => format!("{}-{}", name, tag),
    }
}

fn remove_entry(path: &Path) -> io::Result<()> {
    if std_fs::symlink_metadata(path)?.is_dir() {
        std_fs::remove_dir_all(path)
    } else {
        std_fs::remove_file(path)
    }
}

/// Deletes entries of `root` modified before `cutoff`. A failure on one entry
/// is logged and the sweep moves on.
fn sweep_dir(
    root: &Path,
    cutoff: SystemTime,
    remove: &dyn Fn(&Path) -> io::Result<()>,
) -> SweepReport {
    let mut report = SweepReport::default();

    let entries = match std_fs::read_dir(root) {
        Ok(entries) => entries,
        Err(e) => {
            error!(root = %root.display(), "Failed to list directory for cleanup: {}", e);
            return report;
        }
    };

    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(root = %root.display(), "Failed to read directory entry: {}", e);
                report.failed += 1;
                continue;
            }
        };
        report.scanned += 1;
        let path = entry.path();

        let modified = match entry.metadata().and_then(|m| m.modified()) {
            Ok(modified) => modified,
            Err(e) => {
                error!(path = %path.display(), "Failed to get last modified time: {}", e);
                report.failed += 1;
                continue;
            }
        };

        if modified >= cutoff {
            continue;
        }

        match remove(&path) {
            Ok(()) => {
                debug!(path = %path.display(), "Deleted expired file");
                report.deleted += 1;
            }
            Err(e) => {
                error!(path = %path.display(), "Failed to delete file: {}", e);
                report.failed += 1;
            }
        }
    }

    report
}
