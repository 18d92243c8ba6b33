//! reqwest-backed implementation of both backend traits.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Url};
use serde::{de::DeserializeOwned, Serialize};

use crate::error::BridgeError;

use super::traits::{ChatBackend, ContentBackend};
use super::types::{
    BackendReply, PersonalizeRequest, PersonalizeResponse, QueryRequest, TranslateResponse,
};

/// HTTP client for the chat, translation and personalization endpoints.
///
/// Cloning is cheap; the underlying `reqwest::Client` is reference counted.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: Url,
    timeout_seconds: Option<u64>,
}

impl HttpBackend {
    pub fn new(base_url: &str, timeout_seconds: Option<u64>) -> Result<Self, BridgeError> {
        Self::with_client(Client::new(), base_url, timeout_seconds)
    }

    pub fn with_client(
        client: Client,
        base_url: &str,
        timeout_seconds: Option<u64>,
    ) -> Result<Self, BridgeError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| BridgeError::Config(format!("invalid API base '{base_url}': {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(BridgeError::Config(format!(
                "API base '{base_url}' cannot carry a path"
            )));
        }
        Ok(Self {
            client,
            base_url,
            timeout_seconds,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn timeout_seconds(&self) -> Option<u64> {
        self.timeout_seconds
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, BridgeError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                BridgeError::Config(format!("API base '{}' cannot carry a path", self.base_url))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn apply_timeout(&self, request: RequestBuilder) -> RequestBuilder {
        match self.timeout_seconds {
            Some(timeout) => request.timeout(Duration::from_secs(timeout)),
            None => request,
        }
    }

    fn log_request_payload<T: Serialize>(&self, label: &str, body: &T) {
        if !log::log_enabled!(log::Level::Trace) {
            return;
        }
        if let Ok(json) = serde_json::to_string(body) {
            log::trace!("{label}: {json}");
        }
    }

    async fn send_raw(
        &self,
        request: RequestBuilder,
        context: &str,
    ) -> Result<BackendReply, BridgeError> {
        let response = self.apply_timeout(request).send().await?;
        let status = response.status().as_u16();
        log::debug!("{context} HTTP status: {status}");
        let body = response.text().await?;
        Ok(BackendReply { status, body })
    }

    async fn send_and_parse<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        context: &str,
    ) -> Result<T, BridgeError> {
        let reply = self.send_raw(request, context).await?;
        if !reply.is_success() {
            return Err(reply.server_error());
        }
        reply.parse()
    }
}

#[async_trait]
impl ChatBackend for HttpBackend {
    async fn post_query(&self, request: &QueryRequest) -> Result<BackendReply, BridgeError> {
        let url = self.endpoint(&["chat", "query"])?;
        self.log_request_payload("chat query", request);
        self.send_raw(self.client.post(url).json(request), "chat query")
            .await
    }
}

#[async_trait]
impl ContentBackend for HttpBackend {
    async fn translate(&self, chapter_id: &str, locale: &str) -> Result<String, BridgeError> {
        let mut url = self.endpoint(&["chapters", chapter_id, "translate"])?;
        url.query_pairs_mut().append_pair("target_language", locale);
        let parsed: TranslateResponse = self
            .send_and_parse(self.client.post(url), "translate")
            .await?;
        Ok(parsed.translated_text)
    }

    async fn personalize(
        &self,
        user_id: &str,
        chapter_id: &str,
        base_content: &str,
    ) -> Result<String, BridgeError> {
        let url = self.endpoint(&["personalize", user_id, "chapter", chapter_id])?;
        let body = PersonalizeRequest {
            original_content: base_content,
        };
        self.log_request_payload("personalize", &body);
        let parsed: PersonalizeResponse = self
            .send_and_parse(self.client.post(url).json(&body), "personalize")
            .await?;
        Ok(parsed.personalized_content)
    }
}

#[cfg(test)]
mod tests {
    use mockito::Matcher;

    use super::HttpBackend;
    use crate::backend::{ChatBackend, ContentBackend, QueryRequest};
    use crate::error::BridgeError;

    fn query(text: &str) -> QueryRequest {
        QueryRequest {
            id: "q-1".to_string(),
            text: text.to_string(),
            user_id: None,
            context: None,
        }
    }

    #[tokio::test]
    async fn post_query_returns_status_and_body() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/v1/chat/query")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "id": "q-1",
                "text": "What is ROS?",
                "user_id": null,
                "context": null,
            })))
            .with_status(200)
            .with_body(r#"{"text":"A robotics middleware.","source_references":["ch2"]}"#)
            .create_async()
            .await;

        let backend = HttpBackend::new(&format!("{}/api/v1", server.url()), None).unwrap();
        let reply = backend.post_query(&query("What is ROS?")).await.unwrap();

        mock.assert_async().await;
        assert_eq!(reply.status, 200);
        assert!(reply.body.contains("robotics middleware"));
    }

    #[tokio::test]
    async fn rate_limit_is_reported_as_a_reply_not_an_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/v1/chat/query")
            .with_status(429)
            .create_async()
            .await;

        let backend = HttpBackend::new(&format!("{}/api/v1/", server.url()), None).unwrap();
        let reply = backend.post_query(&query("hi")).await.unwrap();
        assert_eq!(reply.status, 429);
    }

    #[tokio::test]
    async fn unreachable_host_is_a_network_error() {
        let backend = HttpBackend::new("http://127.0.0.1:1/api/v1", Some(2)).unwrap();
        let err = backend.post_query(&query("hi")).await.unwrap_err();
        assert!(matches!(err, BridgeError::Network(_)));
    }

    #[tokio::test]
    async fn translate_sends_target_language() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/v1/chapters/intro/translate")
            .match_query(Matcher::UrlEncoded(
                "target_language".into(),
                "ur".into(),
            ))
            .with_status(200)
            .with_body(r#"{"chapter_id":"intro","translated_text":"ترجمہ","target_language":"ur"}"#)
            .create_async()
            .await;

        let backend = HttpBackend::new(&format!("{}/api/v1", server.url()), None).unwrap();
        let text = backend.translate("intro", "ur").await.unwrap();

        mock.assert_async().await;
        assert_eq!(text, "ترجمہ");
    }

    #[tokio::test]
    async fn personalize_posts_base_content() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/v1/personalize/user123/chapter/intro")
            .match_body(Matcher::Json(serde_json::json!({
                "original_content": "Robots sense and act."
            })))
            .with_status(200)
            .with_body(r#"{"personalized_content":"Robots sense and act, visually."}"#)
            .create_async()
            .await;

        let backend = HttpBackend::new(&format!("{}/api/v1", server.url()), None).unwrap();
        let text = backend
            .personalize("user123", "intro", "Robots sense and act.")
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(text, "Robots sense and act, visually.");
    }

    #[tokio::test]
    async fn content_failures_carry_detail() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/v1/chapters/missing/translate")
            .match_query(Matcher::Any)
            .with_status(404)
            .with_body(r#"{"detail":"Chapter with ID missing not found"}"#)
            .create_async()
            .await;

        let backend = HttpBackend::new(&format!("{}/api/v1", server.url()), None).unwrap();
        let err = backend.translate("missing", "ur").await.unwrap_err();
        match err {
            BridgeError::Server { status, detail } => {
                assert_eq!(status, 404);
                assert!(detail.contains("not found"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn malformed_success_body_is_a_network_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/v1/chapters/intro/translate")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body("not json")
            .create_async()
            .await;

        let backend = HttpBackend::new(&format!("{}/api/v1", server.url()), None).unwrap();
        let err = backend.translate("intro", "ur").await.unwrap_err();
        assert!(matches!(err, BridgeError::Network(_)));
    }

    #[test]
    fn rejects_invalid_base() {
        let err = HttpBackend::new("not a url", None).unwrap_err();
        assert!(matches!(err, BridgeError::Config(_)));
    }
}
