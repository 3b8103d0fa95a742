//! Domain layer for toolbridge
//!
//! This crate contains the core types of the tool bridge: what a tool is,
//! how calls and their outcomes are represented, the append-only
//! conversation, and the turn phase machine. It performs no I/O and has no
//! dependencies on infrastructure or presentation concerns.
//!
//! # Core Concepts
//!
//! - **Registry snapshot**: the immutable set of tools discovered when a
//!   session starts ([`ToolRegistry`])
//! - **Conversation**: the ordered, append-only message log
//!   ([`ConversationState`])
//! - **Turn**: one cycle from operator input to a final answer or a
//!   reported failure ([`TurnPhase`])

pub mod conversation;
pub mod core;
pub mod orchestration;
pub mod tool;
pub mod util;

// Re-export commonly used types
pub use conversation::{
    ConversationState, DEFAULT_MAX_USER_CHARS, Message, MessageContent, Role,
};
pub use core::error::DomainError;
pub use orchestration::{ReasoningOutput, TurnPhase};
pub use tool::{
    ArgumentValidator, DefaultArgumentValidator, ToolCallRequest, ToolCallResult, ToolDescriptor,
    ToolFailure, ToolFailureKind, ToolOutcome, ToolRegistry,
};
