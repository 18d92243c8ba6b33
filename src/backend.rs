//! Transport seam between the session/resolver and the remote services.
//!
//! [`ChatBackend`] reports HTTP statuses, 429 included, as data and leaves
//! their interpretation to the retry driver. [`ContentBackend`] returns
//! decoded layer text.

#[path = "backend/types.rs"]
mod types;

#[path = "backend/traits.rs"]
mod traits;

#[path = "backend/http.rs"]
mod http;

pub use http::HttpBackend;
pub use traits::{ChatBackend, ContentBackend};
pub use types::{BackendReply, QueryRequest};
pub(crate) use types::ChatQueryResponse;
