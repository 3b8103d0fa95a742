//! Turn phase state machine
//!
//! ```text
//!              ┌──────────────────────────────────────────┐
//!              ▼                                          │
//! AwaitingInput ──▶ Reasoning ──▶ Responding ─────────────┘
//!                    │    ▲
//!                    ▼    │
//!               ExecutingTools
//!
//! any phase ──▶ Closed (exit, cancellation, lost session)
//! ```
//!
//! A failed turn returns straight to `AwaitingInput` from `Reasoning` or
//! `ExecutingTools`. `Closed` is terminal.

use crate::core::error::DomainError;
use serde::{Deserialize, Serialize};

/// Phase of the turn orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnPhase {
    AwaitingInput,
    Reasoning,
    ExecutingTools,
    Responding,
    Closed,
}

impl TurnPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            TurnPhase::AwaitingInput => "awaiting_input",
            TurnPhase::Reasoning => "reasoning",
            TurnPhase::ExecutingTools => "executing_tools",
            TurnPhase::Responding => "responding",
            TurnPhase::Closed => "closed",
        }
    }

    pub fn is_closed(&self) -> bool {
        matches!(self, TurnPhase::Closed)
    }

    pub fn can_transition_to(&self, next: TurnPhase) -> bool {
        use TurnPhase::*;
        match (*self, next) {
            (Closed, _) => false,
            (_, Closed) => true,
            (AwaitingInput, Reasoning) => true,
            (Reasoning, ExecutingTools | Responding | AwaitingInput) => true,
            (ExecutingTools, Reasoning | AwaitingInput) => true,
            (Responding, AwaitingInput) => true,
            _ => false,
        }
    }

    /// Move to `next`, rejecting transitions the machine does not allow.
    pub fn transition(self, next: TurnPhase) -> Result<TurnPhase, DomainError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(DomainError::InvalidTransition {
                from: self,
                to: next,
            })
        }
    }
}

impl std::fmt::Display for TurnPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
