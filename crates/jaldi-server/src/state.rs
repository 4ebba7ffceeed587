//! Application state shared by the axum handlers.

use std::sync::Arc;

use crate::config::ServerConfig;
use crate::service::GenerationService;

/// Shared application state for the HTTP server.
///
/// The service holds no graph state between requests; the only shared
/// resource is the report file it overwrites.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<GenerationService>,
}

impl AppState {
    pub fn new(config: &ServerConfig) -> Self {
        AppState {
            service: Arc::new(GenerationService::new(config.report_path.clone())),
        }
    }
}
