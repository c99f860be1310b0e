use std::sync::Arc;

use crate::ai::CandidateAnalyzer;
use crate::config::Config;
use crate::screening::store::CandidateStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// AI backend seam. Production wires `LlmAnalyzer`; tests wire stubs.
    pub analyzer: Arc<dyn CandidateAnalyzer>,
    /// In-memory candidate store for the current session.
    pub store: Arc<CandidateStore>,
    /// Kept on state for handlers that grow runtime config needs.
    #[allow(dead_code)]
    pub config: Config,
}
