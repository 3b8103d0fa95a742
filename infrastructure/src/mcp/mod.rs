//! MCP tool server adapter
//!
//! Speaks JSON-RPC over the stdio of a spawned tool server process.

pub mod connector;
pub mod error;
pub mod protocol;
pub mod session;
pub mod transport;
