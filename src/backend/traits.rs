use async_trait::async_trait;

use crate::error::BridgeError;

use super::types::{BackendReply, QueryRequest};

/// Backend answering conversational queries.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Sends one physical request.
    ///
    /// Only transport failures are errors; every HTTP status, including 429,
    /// comes back as a [`BackendReply`].
    async fn post_query(&self, request: &QueryRequest) -> Result<BackendReply, BridgeError>;
}

/// Backend producing translated and personalized chapter layers.
#[async_trait]
pub trait ContentBackend: Send + Sync {
    async fn translate(&self, chapter_id: &str, locale: &str) -> Result<String, BridgeError>;

    async fn personalize(
        &self,
        user_id: &str,
        chapter_id: &str,
        base_content: &str,
    ) -> Result<String, BridgeError>;
}
