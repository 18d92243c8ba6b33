use uuid::Uuid;

use crate::backend::ChatQueryResponse;
use crate::error::BridgeError;

/// A single user question, immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    id: Uuid,
    text: String,
    user_id: Option<String>,
    context: Option<serde_json::Value>,
}

impl Query {
    /// Creates a query, rejecting text that is empty after trimming.
    pub fn new(text: impl Into<String>) -> Result<Self, BridgeError> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(BridgeError::Validation(
                "query text must not be empty".to_string(),
            ));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            text,
            user_id: None,
            context: None,
        })
    }

    /// Attaches the asking user.
    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    /// Attaches caller-supplied context such as the current chapter.
    pub fn with_context(mut self, context: serde_json::Value) -> Self {
        self.context = Some(context);
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    pub fn context(&self) -> Option<&serde_json::Value> {
        self.context.as_ref()
    }
}

/// A successful answer from the chat backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub text: String,
    pub source_references: Vec<String>,
}

impl Response {
    pub(crate) fn from_wire(wire: ChatQueryResponse) -> Self {
        Self {
            text: wire.text,
            source_references: wire.source_references,
        }
    }
}
