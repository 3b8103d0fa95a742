//! Tool domain module
//!
//! Defines how the agent sees the capabilities of an out-of-process tool
//! server: what a tool is, how it is called, and what a call yields.
//!
//! ```text
//! ┌────────────────┐    ┌─────────────────┐    ┌────────────────┐
//! │ ToolRegistry   │───▶│ ToolCallRequest │───▶│ ToolCallResult │
//! │ (descriptors)  │    │ (from engine)   │    │ (to history)   │
//! └────────────────┘    └─────────────────┘    └────────────────┘
//! ```
//!
//! # Key Types
//!
//! - [`ToolDescriptor`]: name, description and JSON Schema of one tool
//! - [`ToolRegistry`]: immutable, discovery-ordered snapshot of descriptors
//! - [`ToolCallRequest`]: an invocation produced by the reasoning engine
//! - [`ToolCallResult`]: success payload or a typed [`ToolFailure`]
//! - [`ArgumentValidator`]: pure pre-dispatch check of arguments
//!
//! # Architecture
//!
//! - **Domain** (this module): pure definitions, no I/O
//! - **Application** (`ToolSession`): port for dispatching calls
//! - **Infrastructure** (`McpSession`): JSON-RPC over a child process's stdio

pub mod entities;
pub mod registry;
pub mod traits;
pub mod value_objects;

pub use entities::{ToolCallRequest, ToolDescriptor};
pub use registry::ToolRegistry;
pub use traits::{ArgumentValidator, DefaultArgumentValidator};
pub use value_objects::{ToolCallResult, ToolFailure, ToolFailureKind, ToolOutcome};
