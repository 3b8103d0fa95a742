//! REPL (Read-Eval-Print Loop) operator for interactive chat

use crate::ConsoleFormatter;
use async_trait::async_trait;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::path::PathBuf;
use toolbridge_application::{OperatorChannel, TurnOutcome};
use toolbridge_domain::ToolRegistry;
use tracing::{debug, warn};

const PROMPT: &str = "YOU > ";

/// Default history location under the platform data dir.
pub fn default_history_path() -> Option<PathBuf> {
    dirs::data_dir().map(|p| p.join("toolbridge").join("history.txt"))
}

/// Interactive operator backed by a rustyline editor.
///
/// Readline blocks, so each prompt runs on the blocking pool and hands the
/// editor back when the line is in.
pub struct ChatRepl {
    editor: Option<DefaultEditor>,
    history_path: Option<PathBuf>,
}

impl ChatRepl {
    /// Create a new ChatRepl, loading history from `history_path` if given.
    pub fn new(history_path: Option<PathBuf>) -> rustyline::Result<Self> {
        let mut editor = DefaultEditor::new()?;

        if let Some(ref path) = history_path {
            if let Some(parent) = path.parent() {
                let _ = std::fs::create_dir_all(parent);
            }
            if let Err(e) = editor.load_history(path) {
                debug!("No history loaded from {}: {}", path.display(), e);
            }
        }

        Ok(Self {
            editor: Some(editor),
            history_path,
        })
    }

    fn save_history(&mut self) {
        if let (Some(editor), Some(path)) = (self.editor.as_mut(), self.history_path.as_ref())
            && let Err(e) = editor.save_history(path)
        {
            warn!("Could not save history to {}: {}", path.display(), e);
        }
    }
}

#[async_trait]
impl OperatorChannel for ChatRepl {
    async fn next_input(&mut self) -> Option<String> {
        let mut editor = self.editor.take()?;

        let joined = tokio::task::spawn_blocking(move || {
            let line = editor.readline(PROMPT);
            (editor, line)
        })
        .await;

        let (mut editor, line) = match joined {
            Ok(pair) => pair,
            Err(e) => {
                warn!("Prompt task failed: {}", e);
                return None;
            }
        };

        let result = match line {
            Ok(line) => {
                if !line.trim().is_empty() {
                    let _ = editor.add_history_entry(line.as_str());
                }
                Some(line)
            }
            // Ctrl-C at the prompt ends the session like Ctrl-D
            Err(ReadlineError::Interrupted) => {
                println!("^C");
                None
            }
            Err(ReadlineError::Eof) => None,
            Err(err) => {
                eprintln!("Error: {}", err);
                None
            }
        };

        self.editor = Some(editor);
        result
    }

    fn on_session_ready(&mut self, registry: &ToolRegistry) {
        println!();
        print!("{}", ConsoleFormatter::tool_list(registry));
        println!("Type 'exit' or 'quit' to leave.");
        println!();
    }

    fn present(&mut self, outcome: &TurnOutcome) {
        match outcome {
            TurnOutcome::Failed { .. } | TurnOutcome::SessionLost => {
                if let Some(text) = ConsoleFormatter::outcome(outcome) {
                    eprintln!("{}", text);
                }
            }
            _ => {
                if let Some(text) = ConsoleFormatter::outcome(outcome) {
                    println!("{}", text);
                    println!();
                }
            }
        }
    }
}

impl Drop for ChatRepl {
    fn drop(&mut self) {
        self.save_history();
    }
}

/// Non-interactive operator: sends one prompt, keeps the outcome.
pub struct OneShotOperator {
    prompt: Option<String>,
    outcome: Option<TurnOutcome>,
}

impl OneShotOperator {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: Some(prompt.into()),
            outcome: None,
        }
    }

    /// Outcome of the single turn, if it ran.
    pub fn outcome(&self) -> Option<&TurnOutcome> {
        self.outcome.as_ref()
    }

    /// Whether the turn produced an answer.
    pub fn succeeded(&self) -> bool {
        matches!(self.outcome, Some(TurnOutcome::Responded { .. }))
    }
}

#[async_trait]
impl OperatorChannel for OneShotOperator {
    async fn next_input(&mut self) -> Option<String> {
        self.prompt.take()
    }

    fn present(&mut self, outcome: &TurnOutcome) {
        match ConsoleFormatter::plain_answer(outcome) {
            Some(text) => println!("{}", text),
            None => {
                if let Some(text) = ConsoleFormatter::outcome(outcome) {
                    eprintln!("{}", text);
                }
            }
        }
        // SessionLost follows the turn it interrupted; keep the turn's outcome
        if self.outcome.is_none() || !matches!(outcome, TurnOutcome::SessionLost) {
            self.outcome = Some(outcome.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_one_shot_yields_prompt_once() {
        let mut operator = OneShotOperator::new("What is MCP?");

        assert_eq!(operator.next_input().await.as_deref(), Some("What is MCP?"));
        assert_eq!(operator.next_input().await, None);
    }

    #[test]
    fn test_one_shot_records_outcome() {
        let mut operator = OneShotOperator::new("q");
        assert!(!operator.succeeded());

        operator.present(&TurnOutcome::Responded {
            text: "answer".to_string(),
        });

        assert!(operator.succeeded());
        assert_eq!(
            operator.outcome(),
            Some(&TurnOutcome::Responded {
                text: "answer".to_string()
            })
        );
    }

    #[test]
    fn test_one_shot_keeps_turn_outcome_over_session_lost() {
        let mut operator = OneShotOperator::new("q");

        operator.present(&TurnOutcome::Failed {
            reason: "boom".to_string(),
        });
        operator.present(&TurnOutcome::SessionLost);

        assert!(matches!(
            operator.outcome(),
            Some(TurnOutcome::Failed { .. })
        ));
    }

    #[test]
    fn test_default_history_path_is_under_toolbridge() {
        if let Some(path) = default_history_path() {
            assert!(path.ends_with("toolbridge/history.txt"));
        }
    }
}
