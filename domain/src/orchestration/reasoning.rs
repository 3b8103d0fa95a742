//! Output of one reasoning step

use crate::tool::ToolCallRequest;
use serde::{Deserialize, Serialize};

/// What the reasoning engine decided to do with the current conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReasoningOutput {
    /// The engine is done; `text` is the answer for the operator.
    FinalResponse { text: String },
    /// The engine wants these tools called, in order, before it continues.
    ToolCalls { requests: Vec<ToolCallRequest> },
}

impl ReasoningOutput {
    pub fn final_response(text: impl Into<String>) -> Self {
        ReasoningOutput::FinalResponse { text: text.into() }
    }

    pub fn tool_calls(requests: Vec<ToolCallRequest>) -> Self {
        ReasoningOutput::ToolCalls { requests }
    }
}
