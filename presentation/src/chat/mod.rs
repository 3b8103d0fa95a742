//! Interactive chat module
//!
//! Operator channels: a readline-based REPL and a one-shot prompt.

mod repl;

pub use repl::{ChatRepl, OneShotOperator, default_history_path};
