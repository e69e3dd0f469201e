//! Application state shared across handlers.

use std::sync::Arc;

use ward_agent::SpeechClient;
use ward_orchestrator::Orchestrator;

use crate::config::ApiConfig;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// API configuration.
    pub config: Arc<ApiConfig>,
    /// Turn orchestrator, which also owns the sessions.
    pub orchestrator: Arc<Orchestrator>,
    /// Speech synthesis (optional - None when not configured).
    pub speech: Option<Arc<SpeechClient>>,
}

impl AppState {
    pub fn new(
        config: ApiConfig,
        orchestrator: Arc<Orchestrator>,
        speech: Option<SpeechClient>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            orchestrator,
            speech: speech.map(Arc::new),
        }
    }
}
