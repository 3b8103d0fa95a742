//! Turn orchestration domain
//!
//! Pure pieces of the turn loop: the phase machine the orchestrator walks
//! through, and the shape of what the reasoning engine returns.

pub mod phase;
pub mod reasoning;

pub use phase::TurnPhase;
pub use reasoning::ReasoningOutput;
