//! Application layer for toolbridge
//!
//! This crate contains use cases, port definitions, and application configuration.
//! It depends only on the domain layer.

pub mod config;
pub mod ports;
pub mod use_cases;

// Re-export commonly used types
pub use config::{ChatParams, LaunchSpec};
pub use ports::{
    conversation_logger::{ConversationEvent, ConversationLogger, NoConversationLogger},
    operator::OperatorChannel,
    progress::{NoProgress, TurnProgressNotifier},
    reasoning_engine::{ReasoningEngine, ReasoningError},
    tool_session::{SessionError, ToolServerConnector, ToolSession},
};
pub use use_cases::run_chat::{
    RunChatError, RunChatInput, RunChatOutput, RunChatUseCase, list_tools,
};
pub use use_cases::turn_orchestrator::{CloseReason, TurnError, TurnOrchestrator, TurnOutcome};
