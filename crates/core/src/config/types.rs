use serde::{Deserialize, Serialize};
use std::net::IpAddr;

pub use crate::jobs::{JobsConfig, UploadConfig};
pub use crate::storage::StorageConfig;
pub use crate::strategy::ToolsConfig;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub jobs: JobsConfig,
    #[serde(default)]
    pub upload: UploadConfig,
    #[serde(default)]
    pub tools: ToolsConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::from([0, 0, 0, 0])
}

fn default_port() -> u16 {
    8080
}

/// Config view for API responses (local paths hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub server: ServerConfig,
    pub storage: SanitizedStorageConfig,
    pub jobs: JobsConfig,
    pub upload: UploadConfig,
    pub tools: SanitizedToolsConfig,
}

/// Retention policy without the directory locations.
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedStorageConfig {
    pub max_age_secs: u64,
    pub sweep_interval_secs: u64,
    pub initial_sweep_delay_secs: u64,
}

/// Tool settings without the executable paths.
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedToolsConfig {
    pub soffice_configured: bool,
    pub ghostscript_configured: bool,
    pub timeout_secs: u64,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            server: config.server.clone(),
            storage: SanitizedStorageConfig {
                max_age_secs: config.storage.max_age_secs,
                sweep_interval_secs: config.storage.sweep_interval_secs,
                initial_sweep_delay_secs: config.storage.initial_sweep_delay_secs,
            },
            jobs: config.jobs.clone(),
            upload: config.upload.clone(),
            tools: SanitizedToolsConfig {
                soffice_configured: !config.tools.soffice_path.as_os_str().is_empty(),
                ghostscript_configured: !config.tools.ghostscript_path.as_os_str().is_empty(),
                timeout_secs: config.tools.timeout_secs,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_with_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host.to_string(), "0.0.0.0");
        assert_eq!(
            config.storage.originals_dir.to_str().unwrap(),
            "storage/originals"
        );
        assert_eq!(config.storage.max_age_secs, 3600);
        assert_eq!(config.jobs.max_concurrent_jobs, 4);
        assert_eq!(config.tools.timeout_secs, 300);
    }

    #[test]
    fn test_deserialize_partial_sections() {
        let toml = r#"
[server]
host = "127.0.0.1"

[storage]
max_age_secs = 120

[upload]
max_file_size_bytes = 1024
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.server.host.to_string(), "127.0.0.1");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.storage.max_age_secs, 120);
        assert_eq!(config.storage.sweep_interval_secs, 3600);
        assert_eq!(config.upload.max_file_size_bytes, 1024);
    }

    #[test]
    fn test_sanitized_config_hides_paths() {
        let mut config = Config::default();
        config.tools.soffice_path = "/opt/libreoffice/program/soffice".into();

        let sanitized = SanitizedConfig::from(&config);
        assert_eq!(sanitized.server.port, 8080);
        assert!(sanitized.tools.soffice_configured);
        assert_eq!(sanitized.storage.max_age_secs, 3600);

        let json = serde_json::to_string(&sanitized).unwrap();
        assert!(!json.contains("/opt/libreoffice"));
        assert!(!json.contains("storage/originals"));
    }
}
