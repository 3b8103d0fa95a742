//! Conversation domain
//!
//! - [`entities::Message`]: one immutable entry in the history
//! - [`state::ConversationState`]: the append-only log with the operator
//!   input cap

pub mod entities;
pub mod state;

pub use entities::{Message, MessageContent, Role};
pub use state::{ConversationState, DEFAULT_MAX_USER_CHARS};
