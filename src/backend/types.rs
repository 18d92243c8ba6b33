use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::{chat::Query, error::BridgeError};

/// Body of `POST /chat/query`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryRequest {
    pub id: String,
    pub text: String,
    pub user_id: Option<String>,
    pub context: Option<serde_json::Value>,
}

impl From<&Query> for QueryRequest {
    fn from(query: &Query) -> Self {
        Self {
            id: query.id().to_string(),
            text: query.text().to_string(),
            user_id: query.user_id().map(str::to_string),
            context: query.context().cloned(),
        }
    }
}

/// Raw status and body of a chat backend reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendReply {
    pub status: u16,
    pub body: String,
}

impl BackendReply {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Decodes a success body; an undecodable body is a transport failure.
    pub(crate) fn parse<T: DeserializeOwned>(&self) -> Result<T, BridgeError> {
        Ok(serde_json::from_str(&self.body)?)
    }

    /// Builds the error for a non-success reply, preferring the body's
    /// `detail` field.
    pub(crate) fn server_error(&self) -> BridgeError {
        let detail = serde_json::from_str::<ErrorBody>(&self.body)
            .ok()
            .and_then(|body| body.detail)
            .unwrap_or_else(|| format!("HTTP error {}", self.status));
        BridgeError::Server {
            status: self.status,
            detail,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatQueryResponse {
    pub(crate) text: String,
    #[serde(default)]
    pub(crate) source_references: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: Option<String>,
}

#[derive(Serialize)]
pub(super) struct PersonalizeRequest<'a> {
    pub(super) original_content: &'a str,
}

#[derive(Debug, Deserialize)]
pub(super) struct PersonalizeResponse {
    pub(super) personalized_content: String,
}

#[derive(Debug, Deserialize)]
pub(super) struct TranslateResponse {
    pub(super) translated_text: String,
}
