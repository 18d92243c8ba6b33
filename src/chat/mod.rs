mod client;
mod message;
mod query;
mod session;

pub use client::{ResilientQueryClient, RetryNotice};
pub use message::{ConversationLog, Message, MessageId, MessageState, Sender};
pub use query::{Query, Response};
pub use session::{ChatSession, IgnoreReason, SessionState, SubmitOutcome};
