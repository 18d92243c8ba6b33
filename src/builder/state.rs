use std::sync::Arc;

use crate::{
    backend::{ChatBackend, ContentBackend},
    config::BridgeConfig,
    resilience::RequestThrottle,
};

#[derive(Default)]
pub(crate) struct BuilderState {
    pub(crate) config: BridgeConfig,
    pub(crate) hostname: Option<String>,
    pub(crate) origin: Option<String>,
    pub(crate) chat_backend: Option<Arc<dyn ChatBackend>>,
    pub(crate) content_backend: Option<Arc<dyn ContentBackend>>,
    pub(crate) throttle: Option<Arc<RequestThrottle>>,
}

impl BuilderState {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn api_base(&self) -> String {
        self.config.api_base_for(
            self.hostname.as_deref().unwrap_or_default(),
            self.origin.as_deref().unwrap_or_default(),
        )
    }
}
