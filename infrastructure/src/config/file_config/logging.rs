//! Logging configuration from TOML (`[logging]` section)

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileLoggingConfig {
    /// Write diagnostic logs to this file instead of stderr
    pub file: Option<PathBuf>,
    /// Append the JSONL conversation transcript to this file
    pub conversation_log: Option<PathBuf>,
}
