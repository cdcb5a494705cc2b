//! Application state shared across handlers.

use lantern_content::ContentClient;
use lantern_core::config::AppConfig;
use lantern_metadata::MetadataStore;
use std::sync::Arc;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<AppConfig>,
    /// Metadata store (tokens, sessions, engagement).
    pub metadata: Arc<dyn MetadataStore>,
    /// Read-only CMS client.
    pub content: Arc<ContentClient>,
}

impl AppState {
    /// Create new application state.
    pub fn new(
        config: AppConfig,
        metadata: Arc<dyn MetadataStore>,
        content: Arc<ContentClient>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            metadata,
            content,
        }
    }
}
