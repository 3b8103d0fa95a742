//! Operator channel port
//!
//! The human side of the chat: where input lines come from and where turn
//! outcomes go. The REPL adapter lives in the presentation layer; tests use a
//! scripted channel.

use crate::use_cases::turn_orchestrator::TurnOutcome;
use async_trait::async_trait;
use toolbridge_domain::ToolRegistry;

#[async_trait]
pub trait OperatorChannel: Send {
    /// Next line of operator input, or `None` at end of input.
    async fn next_input(&mut self) -> Option<String>;

    /// Called once after the session is established, before the first prompt.
    fn on_session_ready(&mut self, _registry: &ToolRegistry) {}

    /// Show the outcome of a turn.
    fn present(&mut self, outcome: &TurnOutcome);
}
