//! Progress reporting while a turn runs

use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Mutex;
use std::time::Duration;
use toolbridge_application::ports::progress::TurnProgressNotifier;
use toolbridge_domain::{ToolCallRequest, ToolCallResult};

/// Spinner that shows what the turn is waiting on.
///
/// Finished tool calls are printed above the spinner so they stay visible
/// after the turn ends.
pub struct ProgressReporter {
    spinner: Mutex<Option<ProgressBar>>,
}

impl ProgressReporter {
    pub fn new() -> Self {
        Self {
            spinner: Mutex::new(None),
        }
    }

    fn spinner_style() -> ProgressStyle {
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg} {elapsed:.dim}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
    }

    /// Show `message` on the spinner, creating it if needed.
    fn show(&self, message: String) {
        let Ok(mut guard) = self.spinner.lock() else {
            return;
        };
        match guard.as_ref() {
            Some(pb) => {
                pb.set_message(message);
                pb.reset_elapsed();
            }
            None => {
                let pb = ProgressBar::new_spinner();
                pb.set_style(Self::spinner_style());
                pb.enable_steady_tick(Duration::from_millis(100));
                pb.set_message(message);
                *guard = Some(pb);
            }
        }
    }

    fn print_line(&self, line: String) {
        match self.spinner.lock().ok().as_deref().and_then(Option::as_ref) {
            Some(pb) => pb.println(line),
            None => eprintln!("{}", line),
        }
    }

    fn tool_line(result: &ToolCallResult, elapsed: Duration) -> String {
        let millis = elapsed.as_millis();
        match result.failure_detail() {
            None => format!(
                "  {} {} {}",
                "v".green(),
                result.tool_name,
                format!("({} ms)", millis).dimmed()
            ),
            Some(failure) => format!(
                "  {} {} {} {}",
                "x".red(),
                result.tool_name,
                format!("({} ms)", millis).dimmed(),
                failure.kind.as_str().red()
            ),
        }
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl TurnProgressNotifier for ProgressReporter {
    fn on_reasoning_start(&self, round: usize) {
        if round <= 1 {
            self.show("Thinking...".to_string());
        } else {
            self.show(format!("Thinking (round {})...", round));
        }
    }

    fn on_tool_call_start(&self, request: &ToolCallRequest) {
        self.show(format!("Calling {}...", request.tool_name.cyan()));
    }

    fn on_tool_call_end(&self, result: &ToolCallResult, elapsed: Duration) {
        self.print_line(Self::tool_line(result, elapsed));
    }

    fn on_turn_end(&self) {
        if let Ok(mut guard) = self.spinner.lock()
            && let Some(pb) = guard.take()
        {
            pb.finish_and_clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use toolbridge_domain::ToolFailure;

    #[test]
    fn test_tool_line_marks_failures() {
        colored::control::set_override(false);

        let ok = ProgressReporter::tool_line(
            &ToolCallResult::success("search", "hits"),
            Duration::from_millis(42),
        );
        assert_eq!(ok, "  v search (42 ms)");

        let failed = ProgressReporter::tool_line(
            &ToolCallResult::failure("fetch", ToolFailure::transport_closed()),
            Duration::from_millis(7),
        );
        assert_eq!(failed, "  x fetch (7 ms) TRANSPORT_CLOSED");
    }

    #[test]
    fn test_spinner_lifecycle() {
        let reporter = ProgressReporter::new();

        reporter.on_reasoning_start(1);
        reporter.on_tool_call_start(&ToolCallRequest::new("search"));
        assert!(reporter.spinner.lock().unwrap().is_some());

        reporter.on_turn_end();
        assert!(reporter.spinner.lock().unwrap().is_none());

        // Ending twice is harmless
        reporter.on_turn_end();
    }
}
