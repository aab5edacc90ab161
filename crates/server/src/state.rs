use docforge_core::{Config, JobOrchestrator, ProgressTracker, SanitizedConfig, StorageManager};
use std::sync::Arc;

/// Shared application state
pub struct AppState {
    config: Config,
    orchestrator: Arc<JobOrchestrator>,
}

impl AppState {
    pub fn new(config: Config, orchestrator: Arc<JobOrchestrator>) -> Self {
        Self {
            config,
            orchestrator,
        }
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn orchestrator(&self) -> &JobOrchestrator {
        &self.orchestrator
    }

    pub fn tracker(&self) -> &ProgressTracker {
        self.orchestrator.tracker()
    }

    pub fn storage(&self) -> &StorageManager {
        self.orchestrator.storage()
    }
}
