//! Application-level configuration.
//!
//! - [`ChatParams`]: turn loop control (tool rounds, input cap, exit keywords)
//! - [`LaunchSpec`]: how the tool server is started and how long to wait on it

pub mod chat_params;
pub mod launch_spec;

pub use chat_params::ChatParams;
pub use launch_spec::LaunchSpec;
