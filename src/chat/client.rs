use std::fmt;
use std::sync::Arc;

use tokio::time::sleep;

use crate::backend::{ChatBackend, ChatQueryResponse, QueryRequest};
use crate::error::BridgeError;
use crate::resilience::{BackoffPolicy, RetryConfig};

use super::query::{Query, Response};

const RATE_LIMITED: u16 = 429;

/// Progress reported before each backoff wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryNotice {
    /// 1-based number of the retry about to happen
    pub attempt: usize,
    pub max_attempts: usize,
    pub delay_ms: u64,
}

impl fmt::Display for RetryNotice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let secs = self.delay_ms.div_ceil(1_000);
        write!(
            f,
            "Service busy, retrying in {secs}s (attempt {}/{})...",
            self.attempt, self.max_attempts
        )
    }
}

/// Sends one logical query, retrying rate-limited replies with exponential
/// backoff. Transport failures and other statuses are never retried.
pub struct ResilientQueryClient {
    backend: Arc<dyn ChatBackend>,
    cfg: RetryConfig,
    policy: BackoffPolicy,
}

impl ResilientQueryClient {
    pub fn new(backend: Arc<dyn ChatBackend>, cfg: RetryConfig) -> Self {
        let policy = BackoffPolicy::from_config(&cfg);
        Self {
            backend,
            cfg,
            policy,
        }
    }

    pub fn max_attempts(&self) -> usize {
        self.cfg.max_attempts
    }

    pub fn policy(&self) -> &BackoffPolicy {
        &self.policy
    }

    pub async fn send(&self, query: &Query) -> Result<Response, BridgeError> {
        self.send_with_progress(query, |_| {}).await
    }

    /// Like [`send`](Self::send), calling `on_retry` right before each
    /// backoff wait.
    pub async fn send_with_progress<F>(
        &self,
        query: &Query,
        mut on_retry: F,
    ) -> Result<Response, BridgeError>
    where
        F: FnMut(RetryNotice) + Send,
    {
        let request = QueryRequest::from(query);
        let max_attempts = self.cfg.max_attempts;

        for attempt in 0..=max_attempts {
            let reply = self.backend.post_query(&request).await?;

            if reply.status == RATE_LIMITED {
                if attempt == max_attempts {
                    break;
                }
                let delay_ms = self.policy.delay(attempt);
                log::debug!(
                    "query {} rate limited, retrying in {delay_ms}ms (attempt {}/{max_attempts})",
                    request.id,
                    attempt + 1
                );
                on_retry(RetryNotice {
                    attempt: attempt + 1,
                    max_attempts,
                    delay_ms,
                });
                sleep(self.policy.sleep_duration(delay_ms)).await;
                continue;
            }

            if !reply.is_success() {
                return Err(reply.server_error());
            }
            let wire: ChatQueryResponse = reply.parse()?;
            return Ok(Response::from_wire(wire));
        }

        log::warn!(
            "query {} still rate limited after {} requests",
            request.id,
            max_attempts + 1
        );
        Err(BridgeError::RateLimitExceeded {
            attempts: max_attempts + 1,
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::collections::VecDeque;
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    };
    use std::time::Duration;

    use async_trait::async_trait;
    use tokio::time::Instant;

    use super::{ResilientQueryClient, RetryNotice};
    use crate::backend::{BackendReply, ChatBackend, QueryRequest};
    use crate::chat::Query;
    use crate::error::BridgeError;
    use crate::resilience::RetryConfig;

    pub(crate) const OK_BODY: &str = r#"{"text":"Physical AI integrates AI with physical systems.","source_references":["intro#1","intro#4"]}"#;

    /// Replays canned replies in order and records every request.
    pub(crate) struct ScriptedBackend {
        replies: Mutex<VecDeque<Result<BackendReply, BridgeError>>>,
        pub(crate) calls: AtomicUsize,
        pub(crate) call_times: Mutex<Vec<Instant>>,
        pub(crate) requests: Mutex<Vec<QueryRequest>>,
    }

    impl ScriptedBackend {
        pub(crate) fn new(replies: Vec<Result<BackendReply, BridgeError>>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies.into()),
                calls: AtomicUsize::new(0),
                call_times: Mutex::new(Vec::new()),
                requests: Mutex::new(Vec::new()),
            })
        }

        pub(crate) fn rate_limited_then_ok(limited: usize) -> Arc<Self> {
            let mut replies: Vec<_> = (0..limited)
                .map(|_| Ok(BackendReply::new(429, "")))
                .collect();
            replies.push(Ok(BackendReply::new(200, OK_BODY)));
            Self::new(replies)
        }

        pub(crate) fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ChatBackend for ScriptedBackend {
        async fn post_query(&self, request: &QueryRequest) -> Result<BackendReply, BridgeError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.call_times.lock().unwrap().push(Instant::now());
            self.requests.lock().unwrap().push(request.clone());
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(BackendReply::new(429, "")))
        }
    }

    fn client(backend: Arc<ScriptedBackend>) -> ResilientQueryClient {
        ResilientQueryClient::new(backend, RetryConfig::defaults())
    }

    #[tokio::test(start_paused = true)]
    async fn succeeds_after_two_rate_limits() {
        let backend = ScriptedBackend::rate_limited_then_ok(2);
        let client = client(backend.clone());
        let query = Query::new("What is Physical AI?").unwrap();
        let mut notices = Vec::new();

        let start = Instant::now();
        let response = client
            .send_with_progress(&query, |notice| notices.push(notice))
            .await
            .unwrap();

        assert_eq!(backend.calls(), 3);
        assert_eq!(start.elapsed(), Duration::from_millis(3_000));
        assert_eq!(
            notices,
            vec![
                RetryNotice {
                    attempt: 1,
                    max_attempts: 3,
                    delay_ms: 1_000
                },
                RetryNotice {
                    attempt: 2,
                    max_attempts: 3,
                    delay_ms: 2_000
                },
            ]
        );
        assert_eq!(response.source_references, vec!["intro#1", "intro#4"]);
    }

    #[tokio::test(start_paused = true)]
    async fn waits_follow_the_backoff_schedule() {
        let backend = ScriptedBackend::rate_limited_then_ok(3);
        let client = client(backend.clone());
        let query = Query::new("q").unwrap();

        client.send(&query).await.unwrap();

        let times = backend.call_times.lock().unwrap().clone();
        let gaps: Vec<_> = times.windows(2).map(|w| w[1] - w[0]).collect();
        assert_eq!(
            gaps,
            vec![
                Duration::from_millis(1_000),
                Duration::from_millis(2_000),
                Duration::from_millis(4_000),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn notice_precedes_the_wait() {
        let backend = ScriptedBackend::rate_limited_then_ok(1);
        let client = client(backend.clone());
        let query = Query::new("q").unwrap();
        let mut noticed_at = None;

        client
            .send_with_progress(&query, |_| noticed_at = Some(Instant::now()))
            .await
            .unwrap();

        let times = backend.call_times.lock().unwrap().clone();
        let noticed_at = noticed_at.unwrap();
        assert!(noticed_at >= times[0]);
        assert!(noticed_at < times[1]);
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_after_max_attempts_plus_one_requests() {
        let backend = ScriptedBackend::new(Vec::new());
        let client = client(backend.clone());
        let query = Query::new("q").unwrap();
        let mut retries = 0;

        let err = client
            .send_with_progress(&query, |_| retries += 1)
            .await
            .unwrap_err();

        assert!(matches!(err, BridgeError::RateLimitExceeded { attempts: 4 }));
        assert_eq!(backend.calls(), 4);
        assert_eq!(retries, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn server_errors_are_not_retried() {
        let backend = ScriptedBackend::new(vec![Ok(BackendReply::new(
            500,
            r#"{"detail":"vector store offline"}"#,
        ))]);
        let client = client(backend.clone());
        let query = Query::new("q").unwrap();

        let err = client.send(&query).await.unwrap_err();

        assert_eq!(backend.calls(), 1);
        match err {
            BridgeError::Server { status, detail } => {
                assert_eq!(status, 500);
                assert_eq!(detail, "vector store offline");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn transport_failures_are_not_retried() {
        let backend = ScriptedBackend::new(vec![
            Ok(BackendReply::new(429, "")),
            Err(BridgeError::Network("connection reset".to_string())),
        ]);
        let client = client(backend.clone());
        let query = Query::new("q").unwrap();

        let err = client.send(&query).await.unwrap_err();

        assert_eq!(backend.calls(), 2);
        assert!(matches!(err, BridgeError::Network(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn malformed_success_is_a_network_error() {
        let backend = ScriptedBackend::new(vec![Ok(BackendReply::new(200, "{\"txt\":1}"))]);
        let client = client(backend.clone());
        let query = Query::new("q").unwrap();

        let err = client.send(&query).await.unwrap_err();
        assert!(matches!(err, BridgeError::Network(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn every_attempt_resends_the_same_query_id() {
        let backend = ScriptedBackend::rate_limited_then_ok(2);
        let client = client(backend.clone());
        let query = Query::new("q").unwrap();

        client.send(&query).await.unwrap();

        let requests = backend.requests.lock().unwrap();
        assert!(requests.iter().all(|r| r.id == query.id().to_string()));
    }

    #[test]
    fn notice_renders_seconds_and_attempts() {
        let notice = RetryNotice {
            attempt: 2,
            max_attempts: 3,
            delay_ms: 2_000,
        };
        assert_eq!(
            notice.to_string(),
            "Service busy, retrying in 2s (attempt 2/3)..."
        );
    }
}
