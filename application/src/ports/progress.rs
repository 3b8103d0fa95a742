//! Progress notification port
//!
//! Defines the callbacks the orchestrator fires while a turn is running.
//! Implementations live in the presentation layer (spinner, plain log lines).

use std::time::Duration;
use toolbridge_domain::{ToolCallRequest, ToolCallResult};

/// Callback for progress updates during a turn
///
/// Every method has an empty default so implementations only override what
/// they display.
pub trait TurnProgressNotifier: Send + Sync {
    /// The engine is being asked for its next step. `round` starts at 1.
    fn on_reasoning_start(&self, _round: usize) {}

    /// The engine answered (successfully or not).
    fn on_reasoning_end(&self) {}

    /// A tool call is about to be sent to the server.
    fn on_tool_call_start(&self, _request: &ToolCallRequest) {}

    /// A tool call finished with `result` after `elapsed`.
    fn on_tool_call_end(&self, _result: &ToolCallResult, _elapsed: Duration) {}

    /// The turn is over; clear any transient display.
    fn on_turn_end(&self) {}
}

/// No-op progress notifier for when progress reporting is not needed
pub struct NoProgress;

impl TurnProgressNotifier for NoProgress {}
