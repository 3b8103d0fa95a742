//! Presentation layer for toolbridge
//!
//! This crate contains the CLI definition, output formatting,
//! progress reporting and the interactive chat operator.

pub mod chat;
pub mod cli;
pub mod output;
pub mod progress;

// Re-export commonly used types
pub use chat::{ChatRepl, OneShotOperator, default_history_path};
pub use cli::commands::Cli;
pub use output::console::ConsoleFormatter;
pub use progress::reporter::ProgressReporter;
