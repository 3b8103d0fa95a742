//! Console output formatter for chat sessions

use colored::Colorize;
use toolbridge_application::TurnOutcome;
use toolbridge_domain::ToolRegistry;

const SEPARATOR_WIDTH: usize = 60;

/// Formats session and turn output for console display
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    /// The tool list printed once the session is up, one `- name: description`
    /// line per tool followed by a separator.
    pub fn tool_list(registry: &ToolRegistry) -> String {
        let mut output = String::new();

        output.push_str(&format!(
            "{} ({})\n",
            "Available tools:".cyan().bold(),
            registry.len()
        ));
        if registry.is_empty() {
            output.push_str(&format!("  {}\n", "(none)".dimmed()));
        }
        for tool in registry.all() {
            let description = tool.description.lines().next().unwrap_or("").trim();
            if description.is_empty() {
                output.push_str(&format!("- {}\n", tool.name.bold()));
            } else {
                output.push_str(&format!("- {}: {}\n", tool.name.bold(), description));
            }
        }
        output.push_str(&Self::separator());
        output
    }

    /// Render a turn outcome, or `None` when there is nothing to show.
    pub fn outcome(outcome: &TurnOutcome) -> Option<String> {
        match outcome {
            TurnOutcome::Responded { text } => {
                Some(format!("{} {}", "AI >".green().bold(), text))
            }
            TurnOutcome::Failed { reason } => {
                Some(format!("{} {}", "Error:".red().bold(), reason))
            }
            TurnOutcome::Exhausted { rounds } => Some(format!(
                "{} gave up after {} tool rounds without an answer",
                "Warning:".yellow().bold(),
                rounds
            )),
            TurnOutcome::Cancelled => Some(format!("{}", "Turn cancelled.".yellow())),
            TurnOutcome::SessionLost => Some(format!(
                "{} the tool server went away; ending the session",
                "Error:".red().bold()
            )),
            TurnOutcome::Exit => Some("Bye!".to_string()),
            TurnOutcome::Skipped => None,
        }
    }

    /// Plain answer text for non-interactive use (`--prompt`).
    pub fn plain_answer(outcome: &TurnOutcome) -> Option<&str> {
        match outcome {
            TurnOutcome::Responded { text } => Some(text),
            _ => None,
        }
    }

    pub fn separator() -> String {
        format!("{}\n", "-".repeat(SEPARATOR_WIDTH).dimmed())
    }
}
