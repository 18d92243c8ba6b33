use std::sync::Arc;

use crate::{
    backend::{ChatBackend, ContentBackend},
    config::BridgeConfig,
};

use super::state::BuilderState;

/// Builder for wiring a chat session and content resolver to their backends.
pub struct BridgeBuilder {
    pub(super) state: BuilderState,
}

impl Default for BridgeBuilder {
    fn default() -> Self {
        Self {
            state: BuilderState::new(),
        }
    }
}

impl BridgeBuilder {
    /// Creates a new builder with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts from a loaded configuration; later calls override it.
    pub fn config(mut self, config: BridgeConfig) -> Self {
        self.state.config = config;
        self
    }

    /// Sets the API base explicitly.
    pub fn api_base(mut self, url: impl Into<String>) -> Self {
        self.state.config.api_base = Some(url.into());
        self
    }

    /// Sets where the UI is served from, used to derive the API base.
    pub fn page_location(mut self, hostname: impl Into<String>, origin: impl Into<String>) -> Self {
        self.state.hostname = Some(hostname.into());
        self.state.origin = Some(origin.into());
        self
    }

    /// Sets a per-request timeout in seconds.
    pub fn timeout_seconds(mut self, timeout_seconds: u64) -> Self {
        self.state.config.request_timeout_secs = Some(timeout_seconds);
        self
    }

    /// Uses a custom chat transport instead of HTTP.
    pub fn chat_backend(mut self, backend: Arc<dyn ChatBackend>) -> Self {
        self.state.chat_backend = Some(backend);
        self
    }

    /// Uses a custom content transport instead of HTTP.
    pub fn content_backend(mut self, backend: Arc<dyn ContentBackend>) -> Self {
        self.state.content_backend = Some(backend);
        self
    }
}
