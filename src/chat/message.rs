use std::fmt;

use uuid::Uuid;

/// Who authored a message in the conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sender {
    /// The person asking questions
    User,
    /// The chat backend
    Bot,
}

/// Lifecycle of a message in the log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageState {
    /// Final text is available
    Delivered,
    /// Placeholder while the query is in flight
    Thinking,
    /// Placeholder while waiting out a rate limit
    Retrying,
    /// The query failed; text explains why
    Errored,
}

impl MessageState {
    /// Whether the message is a placeholder that will be replaced.
    pub fn is_pending(self) -> bool {
        matches!(self, MessageState::Thinking | MessageState::Retrying)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MessageId(Uuid);

impl MessageId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single entry in the conversation log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub id: MessageId,
    pub sender: Sender,
    pub text: String,
    pub source_references: Vec<String>,
    pub state: MessageState,
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            id: MessageId::new(),
            sender: Sender::User,
            text: text.into(),
            source_references: Vec::new(),
            state: MessageState::Delivered,
        }
    }

    pub fn thinking(text: impl Into<String>) -> Self {
        Self {
            id: MessageId::new(),
            sender: Sender::Bot,
            text: text.into(),
            source_references: Vec::new(),
            state: MessageState::Thinking,
        }
    }
}

/// Ordered message log.
///
/// Only appends and in-place updates of an existing slot are possible, so a
/// bot answer always stays right after the question it belongs to.
#[derive(Debug, Clone, Default)]
pub struct ConversationLog {
    messages: Vec<Message>,
}

impl ConversationLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: Message) -> MessageId {
        let id = message.id;
        self.messages.push(message);
        id
    }

    /// Mutates the message with `id` in place. Returns false if it is unknown.
    pub fn update<F>(&mut self, id: MessageId, f: F) -> bool
    where
        F: FnOnce(&mut Message),
    {
        match self.messages.iter_mut().find(|m| m.id == id) {
            Some(message) => {
                f(message);
                true
            }
            None => false,
        }
    }

    pub fn get(&self, id: MessageId) -> Option<&Message> {
        self.messages.iter().find(|m| m.id == id)
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
