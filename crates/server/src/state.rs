//! Application State
//!
//! Shared state across all handlers. Everything here is constructed once at
//! startup and read-only afterwards; handlers never mutate it.

use std::sync::Arc;

use wire_extract_config::Settings;
use wire_extract_pipeline::FieldExtractor;

/// Application state
#[derive(Clone)]
pub struct AppState {
    /// Configuration loaded at startup
    pub config: Arc<Settings>,
    /// Extraction orchestrator (models, vectorizer and encoders loaded)
    pub extractor: Arc<FieldExtractor>,
}

impl AppState {
    pub fn new(config: Settings, extractor: FieldExtractor) -> Self {
        Self {
            config: Arc::new(config),
            extractor: Arc::new(extractor),
        }
    }
}
