//! Use cases
//!
//! - [`run_chat`]: session lifecycle: connect, converse, release
//! - [`turn_orchestrator`]: the per-turn reasoning / tool-call loop

pub mod run_chat;
pub mod turn_orchestrator;
