use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::{broadcast, watch};

use crate::error::BridgeError;
use crate::resilience::RequestThrottle;

use super::client::{ResilientQueryClient, RetryNotice};
use super::message::{ConversationLog, Message, MessageId, MessageState};
use super::query::{Query, Response};

const THINKING_TEXT: &str = "Thinking...";
const CANCELLED_TEXT: &str = "Request cancelled.";
const TRANSITION_CAPACITY: usize = 16;

/// Where the session is in the life of its current query.
///
/// Every change is published on [`ChatSession::transitions`], so a submission
/// is observed as `Submitted`, then `AwaitingResponse`, then `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    /// The user message is in the log; no placeholder yet
    Submitted,
    /// The thinking placeholder is shown and the query is in flight
    AwaitingResponse,
}

/// Why a submission was dropped without touching the log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    EmptyText,
    Busy,
    Throttled,
}

/// Result of a call to [`ChatSession::submit`].
#[derive(Debug)]
pub enum SubmitOutcome {
    /// Nothing was sent and the log is unchanged
    Ignored(IgnoreReason),
    /// The bot message was filled with the backend's answer
    Delivered(MessageId),
    /// The bot message now explains the failure
    Errored {
        message_id: MessageId,
        error: BridgeError,
    },
}

#[derive(Debug)]
struct Inner {
    log: ConversationLog,
    state: SessionState,
}

/// Conversation state machine driving one query at a time.
///
/// The log lives behind a mutex so a UI can read snapshots while a query is
/// in flight; [`ChatSession::changes`] signals every mutation.
pub struct ChatSession {
    client: ResilientQueryClient,
    throttle: Arc<RequestThrottle>,
    inner: Mutex<Inner>,
    revision: watch::Sender<u64>,
    transitions: broadcast::Sender<SessionState>,
    user_id: Option<String>,
}

impl ChatSession {
    pub fn new(client: ResilientQueryClient, throttle: Arc<RequestThrottle>) -> Self {
        let (revision, _) = watch::channel(0);
        let (transitions, _) = broadcast::channel(TRANSITION_CAPACITY);
        Self {
            client,
            throttle,
            inner: Mutex::new(Inner {
                log: ConversationLog::new(),
                state: SessionState::Idle,
            }),
            revision,
            transitions,
            user_id: None,
        }
    }

    /// Attaches a user id to every query sent from this session.
    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    pub fn state(&self) -> SessionState {
        self.lock().state
    }

    /// Whether new submissions would be ignored as busy.
    pub fn is_busy(&self) -> bool {
        self.state() != SessionState::Idle
    }

    /// Snapshot of the conversation in order.
    pub fn messages(&self) -> Vec<Message> {
        self.lock().log.messages().to_vec()
    }

    /// Receiver that ticks on every change to the log or state.
    pub fn changes(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    /// Receiver for every state transition, in order.
    pub fn transitions(&self) -> broadcast::Receiver<SessionState> {
        self.transitions.subscribe()
    }

    pub async fn submit(&self, text: &str) -> SubmitOutcome {
        self.submit_with_context(text, None).await
    }

    /// Submits `text` with optional caller context, e.g. the open chapter.
    pub async fn submit_with_context(
        &self,
        text: &str,
        context: Option<serde_json::Value>,
    ) -> SubmitOutcome {
        let query = match self.build_query(text, context) {
            Ok(query) => query,
            Err(err) => {
                log::debug!("ignoring submission: {err}");
                return SubmitOutcome::Ignored(IgnoreReason::EmptyText);
            }
        };

        let bot_id = match self.begin(&query) {
            Ok(id) => id,
            Err(reason) => {
                log::debug!("ignoring submission: {reason:?}");
                return SubmitOutcome::Ignored(reason);
            }
        };

        let in_flight = InFlight::new(self, bot_id);
        let result = self
            .client
            .send_with_progress(&query, |notice| self.show_retry(bot_id, notice))
            .await;
        self.finish(in_flight.complete(), result)
    }

    fn build_query(
        &self,
        text: &str,
        context: Option<serde_json::Value>,
    ) -> Result<Query, BridgeError> {
        let mut query = Query::new(text)?;
        if let Some(user_id) = &self.user_id {
            query = query.with_user(user_id.clone());
        }
        if let Some(context) = context {
            query = query.with_context(context);
        }
        Ok(query)
    }

    /// Claims the session and appends the user/thinking pair.
    fn begin(&self, query: &Query) -> Result<MessageId, IgnoreReason> {
        let mut inner = self.lock();
        if inner.state != SessionState::Idle {
            return Err(IgnoreReason::Busy);
        }
        if !self.throttle.try_acquire_now() {
            return Err(IgnoreReason::Throttled);
        }
        inner.log.push(Message::user(query.text()));
        self.set_state(&mut inner, SessionState::Submitted);
        let bot_id = inner.log.push(Message::thinking(THINKING_TEXT));
        self.set_state(&mut inner, SessionState::AwaitingResponse);
        drop(inner);
        self.bump();
        Ok(bot_id)
    }

    fn show_retry(&self, bot_id: MessageId, notice: RetryNotice) {
        self.lock().log.update(bot_id, |message| {
            message.text = notice.to_string();
            message.state = MessageState::Retrying;
        });
        self.bump();
    }

    fn finish(&self, bot_id: MessageId, result: Result<Response, BridgeError>) -> SubmitOutcome {
        let mut inner = self.lock();
        let outcome = match result {
            Ok(response) => {
                inner.log.update(bot_id, |message| {
                    message.text = response.text;
                    message.source_references = response.source_references;
                    message.state = MessageState::Delivered;
                });
                SubmitOutcome::Delivered(bot_id)
            }
            Err(error) => {
                log::warn!("chat query failed: {error}");
                inner.log.update(bot_id, |message| {
                    message.text = error.user_message().to_string();
                    message.state = MessageState::Errored;
                });
                SubmitOutcome::Errored {
                    message_id: bot_id,
                    error,
                }
            }
        };
        self.set_state(&mut inner, SessionState::Idle);
        drop(inner);
        self.bump();
        outcome
    }

    /// Resolves a placeholder whose submission was dropped before finishing.
    fn abandon(&self, bot_id: MessageId) {
        log::debug!("submission dropped while awaiting message {bot_id}");
        let mut inner = self.lock();
        inner.log.update(bot_id, |message| {
            message.text = CANCELLED_TEXT.to_string();
            message.state = MessageState::Errored;
        });
        self.set_state(&mut inner, SessionState::Idle);
        drop(inner);
        self.bump();
    }

    fn set_state(&self, inner: &mut Inner, state: SessionState) {
        inner.state = state;
        // no subscribers is fine
        let _ = self.transitions.send(state);
    }

    fn bump(&self) {
        self.revision.send_modify(|rev| *rev += 1);
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Releases the session if the submitting future is dropped mid-flight.
struct InFlight<'a> {
    session: &'a ChatSession,
    bot_id: MessageId,
    armed: bool,
}

impl<'a> InFlight<'a> {
    fn new(session: &'a ChatSession, bot_id: MessageId) -> Self {
        Self {
            session,
            bot_id,
            armed: true,
        }
    }

    fn complete(mut self) -> MessageId {
        self.armed = false;
        self.bot_id
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.session.abandon(self.bot_id);
        }
    }
}
