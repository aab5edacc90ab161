//! Configuration for the storage module.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Locations of the artifact roots and their expiry policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory receiving caller-supplied originals.
    #[serde(default = "default_originals_dir")]
    pub originals_dir: PathBuf,

    /// Directory receiving strategy output.
    #[serde(default = "default_processed_dir")]
    pub processed_dir: PathBuf,

    /// Artifacts older than this are removed by the sweep.
    #[serde(default = "default_max_age")]
    pub max_age_secs: u64,

    /// Interval between recurring sweeps.
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,

    /// Delay before the first sweep after startup.
    #[serde(default = "default_initial_delay")]
    pub initial_sweep_delay_secs: u64,
}

fn default_originals_dir() -> PathBuf {
    PathBuf::from("storage/originals")
}

fn default_processed_dir() -> PathBuf {
    PathBuf::from("storage/processed")
}

fn default_max_age() -> u64 {
    3600 // 1 hour
}

fn default_sweep_interval() -> u64 {
    3600
}

fn default_initial_delay() -> u64 {
    60
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            originals_dir: default_originals_dir(),
            processed_dir: default_processed_dir(),
            max_age_secs: default_max_age(),
            sweep_interval_secs: default_sweep_interval(),
            initial_sweep_delay_secs: default_initial_delay(),
        }
    }
}

impl StorageConfig {
    /// Creates a config rooted at the given directories.
    pub fn with_dirs(originals_dir: PathBuf, processed_dir: PathBuf) -> Self {
        Self {
            originals_dir,
            processed_dir,
            ..Default::default()
        }
    }

    /// Sets the maximum artifact age in seconds.
    pub fn with_max_age(mut self, secs: u64) -> Self {
        self.max_age_secs = secs;
        self
    }

    pub fn max_age(&self) -> Duration {
        Duration::from_secs(self.max_age_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }

    pub fn initial_sweep_delay(&self) -> Duration {
        Duration::from_secs(self.initial_sweep_delay_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = StorageConfig::default();
        assert_eq!(config.originals_dir, PathBuf::from("storage/originals"));
        assert_eq!(config.processed_dir, PathBuf::from("storage/processed"));
        assert_eq!(config.max_age(), Duration::from_secs(3600));
        assert_eq!(config.initial_sweep_delay(), Duration::from_secs(60));
    }

    #[test]
    fn test_deserialize_partial() {
        let toml = r#"
            originals_dir = "/data/in"
            max_age_secs = 120
        "#;
        let config: StorageConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.originals_dir, PathBuf::from("/data/in"));
        assert_eq!(config.processed_dir, PathBuf::from("storage/processed"));
        assert_eq!(config.max_age_secs, 120);
        assert_eq!(config.sweep_interval_secs, 3600);
    }
}
