use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - Worker pool and upload limit are non-zero
/// - Storage roots are distinct and swept at a non-zero interval
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    let fail = |msg: &str| Err(ConfigError::ValidationError(msg.to_string()));

    if config.server.port == 0 {
        return fail("server.port cannot be 0");
    }
    if config.jobs.max_concurrent_jobs == 0 {
        return fail("jobs.max_concurrent_jobs must be at least 1");
    }
    if config.upload.max_file_size_bytes == 0 {
        return fail("upload.max_file_size_bytes cannot be 0");
    }
    if config.storage.originals_dir == config.storage.processed_dir {
        return fail("storage.originals_dir and storage.processed_dir must differ");
    }
    if config.storage.sweep_interval_secs == 0 {
        return fail("storage.sweep_interval_secs cannot be 0");
    }

    Ok(())
}
