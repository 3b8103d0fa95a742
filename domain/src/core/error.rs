//! Domain error types

use crate::orchestration::phase::TurnPhase;
use thiserror::Error;

/// Domain-level errors
#[derive(Error, Debug, PartialEq, Eq)]
pub enum DomainError {
    #[error("Duplicate tool name in registry: {0}")]
    DuplicateTool(String),

    #[error("Tool name must not be empty")]
    EmptyToolName,

    #[error("Invalid turn transition: {from} -> {to}")]
    InvalidTransition { from: TurnPhase, to: TurnPhase },
}
