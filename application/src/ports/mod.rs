//! Port definitions (interfaces for external adapters)
//!
//! Ports define the contracts that infrastructure and presentation adapters
//! must implement.

pub mod conversation_logger;
pub mod operator;
pub mod progress;
pub mod reasoning_engine;
pub mod tool_session;
