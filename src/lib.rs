//! Client-side mediator between an interactive textbook UI and its remote
//! services.
//!
//! * [`chat::ChatSession`] sends questions through a throttled,
//!   rate-limit-aware [`chat::ResilientQueryClient`] and keeps the
//!   conversation log.
//! * [`content::ContentResolver`] picks the chapter content to display from
//!   the original, translated and personalized layers, dropping results made
//!   stale by navigation.
//!
//! Use [`builder::BridgeBuilder`] to wire both to the HTTP backend:
//!
//! ```no_run
//! use studybridge::builder::BridgeBuilder;
//!
//! # async fn run() -> Result<(), studybridge::error::BridgeError> {
//! let bridge = BridgeBuilder::new()
//!     .page_location("localhost", "http://localhost:3000")
//!     .user_id("user123")
//!     .build()?;
//!
//! bridge.session().submit("What is Physical AI?").await;
//! bridge.resolver().show("intro", "ur", "<p>Original</p>").await;
//! # Ok(())
//! # }
//! ```

pub mod backend;
pub mod builder;
pub mod chat;
pub mod config;
pub mod content;
pub mod error;
#[cfg(feature = "logging")]
pub mod logging;
pub mod resilience;

pub use builder::{Bridge, BridgeBuilder};
pub use error::BridgeError;
