use std::sync::Arc;

use crate::{
    backend::{ChatBackend, ContentBackend, HttpBackend},
    chat::{ChatSession, ResilientQueryClient},
    content::ContentResolver,
    error::BridgeError,
    resilience::RequestThrottle,
};

use super::bridge_builder::BridgeBuilder;
use super::state::BuilderState;

/// A wired chat session and content resolver.
pub struct Bridge {
    session: ChatSession,
    resolver: Arc<ContentResolver>,
}

impl Bridge {
    pub fn session(&self) -> &ChatSession {
        &self.session
    }

    pub fn resolver(&self) -> &Arc<ContentResolver> {
        &self.resolver
    }

    pub fn into_parts(self) -> (ChatSession, Arc<ContentResolver>) {
        (self.session, self.resolver)
    }
}

impl BridgeBuilder {
    pub fn build(self) -> Result<Bridge, BridgeError> {
        self.state.build()
    }
}

impl BuilderState {
    fn build(mut self) -> Result<Bridge, BridgeError> {
        self.validate()?;
        let (chat_backend, content_backend) = self.backends()?;
        let cfg = self.config;

        let throttle = self
            .throttle
            .take()
            .unwrap_or_else(|| Arc::new(RequestThrottle::from_config(&cfg.throttle)));
        let client = ResilientQueryClient::new(chat_backend, cfg.retry.clone());
        let mut session = ChatSession::new(client, throttle);
        if let Some(user_id) = &cfg.content.user_id {
            session = session.with_user(user_id.clone());
        }

        let resolver = Arc::new(ContentResolver::new(content_backend, cfg.content));
        Ok(Bridge { session, resolver })
    }

    fn validate(&self) -> Result<(), BridgeError> {
        if self.config.content.default_locale.trim().is_empty() {
            return Err(BridgeError::Config(
                "default locale must not be empty".to_string(),
            ));
        }
        if self.config.retry.max_delay_ms < self.config.retry.base_delay_ms {
            log::warn!(
                "max backoff {}ms is below base {}ms; every retry will wait {}ms",
                self.config.retry.max_delay_ms,
                self.config.retry.base_delay_ms,
                self.config.retry.max_delay_ms
            );
        }
        Ok(())
    }

    /// Uses injected transports, filling gaps with one shared HTTP client.
    fn backends(
        &mut self,
    ) -> Result<(Arc<dyn ChatBackend>, Arc<dyn ContentBackend>), BridgeError> {
        match (self.chat_backend.take(), self.content_backend.take()) {
            (Some(chat), Some(content)) => Ok((chat, content)),
            (chat, content) => {
                let api_base = self.api_base();
                log::debug!("using HTTP backend at {api_base}");
                let http = Arc::new(HttpBackend::new(
                    &api_base,
                    self.config.request_timeout_secs,
                )?);
                let chat = match chat {
                    Some(chat) => chat,
                    None => http.clone() as Arc<dyn ChatBackend>,
                };
                let content = match content {
                    Some(content) => content,
                    None => http as Arc<dyn ContentBackend>,
                };
                Ok((chat, content))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::builder::BridgeBuilder;
    use crate::config::{BridgeConfig, LOCAL_API_BASE};
    use crate::error::BridgeError;

    #[test]
    fn local_page_uses_local_api_base() {
        let builder = BridgeBuilder::new().page_location("localhost", "http://localhost:3000");
        assert_eq!(builder.state.api_base(), LOCAL_API_BASE);
    }

    #[test]
    fn deployed_page_uses_same_origin() {
        let builder =
            BridgeBuilder::new().page_location("book.example.org", "https://book.example.org");
        assert_eq!(builder.state.api_base(), "https://book.example.org/api/v1");
    }

    #[test]
    fn builder_calls_override_loaded_config() {
        let cfg = BridgeConfig::from_toml_str("[retry]\nmax_attempts = 7").unwrap();
        let builder = BridgeBuilder::new()
            .config(cfg)
            .max_attempts(2)
            .backoff(500, 4_000)
            .min_interval_ms(100)
            .user_id("user123")
            .personalization(false);

        let cfg = &builder.state.config;
        assert_eq!(cfg.retry.max_attempts, 2);
        assert_eq!(cfg.retry.base_delay_ms, 500);
        assert_eq!(cfg.retry.max_delay_ms, 4_000);
        assert_eq!(cfg.throttle.min_interval_ms, 100);
        assert_eq!(cfg.content.personalization_user(), None);
    }

    #[tokio::test]
    async fn build_wires_session_and_resolver() {
        let bridge = BridgeBuilder::new()
            .api_base("http://127.0.0.1:8000/api/v1")
            .user_id("user123")
            .default_locale("en")
            .build()
            .unwrap();

        assert_eq!(bridge.session().user_id(), Some("user123"));
        assert_eq!(bridge.resolver().config().default_locale, "en");
        assert!(bridge.resolver().effective().is_none());
    }

    #[test]
    fn empty_default_locale_is_rejected() {
        let result = BridgeBuilder::new().default_locale(" ").build();
        assert!(matches!(result, Err(BridgeError::Config(_))));
    }

    #[test]
    fn invalid_api_base_is_rejected() {
        let result = BridgeBuilder::new().api_base("::not a url::").build();
        assert!(matches!(result, Err(BridgeError::Config(_))));
    }
}
