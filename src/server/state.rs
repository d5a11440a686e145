//! Application state shared across handlers

use crate::inference::InferenceService;
use crate::server::ServerConfig;

/// Shared server state: the inference service plus the config it was
/// started with. The service owns the only mutable piece (the swappable
/// artifact reference); everything else is read-only.
pub struct AppState {
    pub config: ServerConfig,
    pub service: InferenceService,
}

impl AppState {
    pub fn new(config: ServerConfig, service: InferenceService) -> Self {
        Self { config, service }
    }
}
