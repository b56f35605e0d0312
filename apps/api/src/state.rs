use std::sync::Arc;

use crate::config::Config;
use crate::store::InterviewStore;
use crate::transcription::Transcriber;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn InterviewStore>,
    /// Speech-to-text for submitted answers. Default: WhisperClient.
    pub transcriber: Arc<dyn Transcriber>,
    pub config: Config,
}
