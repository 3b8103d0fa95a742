//! JSONL transcript writer for conversation events.
//!
//! Each [`ConversationEvent`] becomes one JSON line carrying the event's
//! payload plus `type`, `timestamp`, `session` and `seq`. Runs append to the
//! same file, so `session` tells them apart.

use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use toolbridge_application::ports::conversation_logger::{ConversationEvent, ConversationLogger};
use tracing::warn;

/// Appends one JSON object per line to a transcript file.
///
/// Thread-safe via `Mutex<BufWriter<File>>`; every line is flushed.
pub struct JsonlConversationLogger {
    writer: Mutex<BufWriter<File>>,
    path: PathBuf,
    session_id: String,
    seq: AtomicU64,
}

impl JsonlConversationLogger {
    /// Open (or create) the transcript at `path` in append mode.
    ///
    /// Parent directories are created as needed.
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let session_id = chrono::Utc::now().format("%Y%m%dT%H%M%S%.3fZ").to_string();

        Ok(Self {
            writer: Mutex::new(BufWriter::new(file)),
            path: path.to_path_buf(),
            session_id,
            seq: AtomicU64::new(0),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    fn record(&self, event: ConversationEvent) -> serde_json::Value {
        let timestamp = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true);
        let seq = self.seq.fetch_add(1, Ordering::Relaxed);

        let mut map = match event.payload {
            serde_json::Value::Object(map) => map,
            other => {
                let mut map = serde_json::Map::new();
                map.insert("data".to_string(), other);
                map
            }
        };
        map.insert("type".to_string(), event.event_type.into());
        map.insert("timestamp".to_string(), timestamp.into());
        map.insert("session".to_string(), self.session_id.clone().into());
        map.insert("seq".to_string(), seq.into());
        serde_json::Value::Object(map)
    }
}

impl ConversationLogger for JsonlConversationLogger {
    fn log(&self, event: ConversationEvent) {
        let record = self.record(event);
        let Ok(line) = serde_json::to_string(&record) else {
            return;
        };

        if let Ok(mut writer) = self.writer.lock() {
            let written = writeln!(writer, "{}", line).and_then(|_| writer.flush());
            if let Err(e) = written {
                warn!("Could not write to {}: {}", self.path.display(), e);
            }
        }
    }
}

impl Drop for JsonlConversationLogger {
    fn drop(&mut self) {
        if let Ok(mut writer) = self.writer.lock() {
            let _ = writer.flush();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use toolbridge_domain::{ToolCallRequest, ToolCallResult, ToolDescriptor};

    fn read_lines(path: &Path) -> Vec<serde_json::Value> {
        std::fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    #[test]
    fn test_writes_one_record_per_event() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("conversation.jsonl");
        let logger = JsonlConversationLogger::open(&path).unwrap();

        let tools = vec![ToolDescriptor::new("search", "Search the web")];
        logger.log(ConversationEvent::session_started("gpt-4", &tools));
        let request = ToolCallRequest::new("search").with_arg("query", "rust");
        logger.log(ConversationEvent::tool_call(&request));
        logger.log(ConversationEvent::tool_result(
            &ToolCallResult::success("search", "3 results"),
            Duration::from_millis(12),
        ));
        let session = logger.session_id().to_string();
        drop(logger);

        let records = read_lines(&path);
        assert_eq!(records.len(), 3);

        assert_eq!(records[0]["type"], "session_started");
        assert_eq!(records[0]["tools"][0], "search");
        assert_eq!(records[1]["type"], "tool_call");
        assert_eq!(records[1]["arguments"]["query"], "rust");
        assert_eq!(records[2]["type"], "tool_result");
        assert_eq!(records[2]["preview"], "3 results");
        assert_eq!(records[2]["duration_ms"], 12);

        for (i, record) in records.iter().enumerate() {
            assert_eq!(record["seq"], i as u64);
            assert!(record["timestamp"].as_str().unwrap().ends_with('Z'));
            assert_eq!(record["session"], session.as_str());
        }
    }

    #[test]
    fn test_appends_across_sessions() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("conversation.jsonl");

        let first = JsonlConversationLogger::open(&path).unwrap();
        first.log(ConversationEvent::new("first", serde_json::json!({})));
        drop(first);

        let second = JsonlConversationLogger::open(&path).unwrap();
        second.log(ConversationEvent::new("second", serde_json::json!({})));
        drop(second);

        let records = read_lines(&path);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["type"], "first");
        assert_eq!(records[1]["type"], "second");
        assert_eq!(records[1]["seq"], 0);
    }

    #[test]
    fn test_non_object_payload_is_wrapped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("conversation.jsonl");
        let logger = JsonlConversationLogger::open(&path).unwrap();

        logger.log(ConversationEvent::new(
            "note",
            serde_json::json!("just a string"),
        ));
        drop(logger);

        let records = read_lines(&path);
        assert_eq!(records[0]["type"], "note");
        assert_eq!(records[0]["data"], "just a string");
    }

    #[test]
    fn test_open_fails_when_parent_is_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "x").unwrap();

        assert!(JsonlConversationLogger::open(blocker.join("conversation.jsonl")).is_err());
    }
}
