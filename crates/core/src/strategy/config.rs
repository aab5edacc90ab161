//! Configuration for strategies backed by external tools.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Paths and limits for the office and PDF tool chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsConfig {
    /// Path to the LibreOffice `soffice` binary.
    #[serde(default = "default_soffice_path")]
    pub soffice_path: PathBuf,

    /// Path to the Ghostscript binary.
    #[serde(default = "default_ghostscript_path")]
    pub ghostscript_path: PathBuf,

    /// Timeout for a single tool invocation in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_soffice_path() -> PathBuf {
    PathBuf::from("soffice")
}

fn default_ghostscript_path() -> PathBuf {
    PathBuf::from("gs")
}

fn default_timeout() -> u64 {
    300 // 5 minutes
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            soffice_path: default_soffice_path(),
            ghostscript_path: default_ghostscript_path(),
            timeout_secs: default_timeout(),
        }
    }
}

impl ToolsConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Sets the timeout in seconds.
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }
}
