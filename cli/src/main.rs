//! CLI entrypoint for toolbridge
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use anyhow::{Context, Result, bail};
use clap::Parser;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use toolbridge_application::{
    ConversationLogger, NoConversationLogger, NoProgress, RunChatInput, RunChatUseCase,
    TurnProgressNotifier, list_tools,
};
use toolbridge_infrastructure::{
    ConfigLoader, FileConfig, JsonlConversationLogger, McpConnector, OpenAiReasoningEngine,
};
use toolbridge_presentation::{
    ChatRepl, Cli, ConsoleFormatter, OneShotOperator, ProgressReporter, default_history_path,
};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    if cli.show_config {
        ConfigLoader::print_config_sources(cli.config.as_ref());
        return Ok(ExitCode::SUCCESS);
    }

    let mut config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_ref())?
    };
    if let Some(model) = &cli.model {
        config.engine.model = model.clone();
    }

    let log_file = cli.log_file.clone().or_else(|| config.logging.file.clone());
    let _log_guard = init_logging(cli.verbose, log_file.as_deref())?;

    info!("Starting toolbridge");

    let issues = config.validate();
    if !issues.is_empty() {
        for issue in &issues {
            eprintln!("Config error: {}", issue);
        }
        bail!("{} configuration error(s)", issues.len());
    }

    let launch = config.tool_server.to_launch_spec();
    let connector = Arc::new(McpConnector::new());

    // === Tool listing ===
    if cli.tools {
        let registry = list_tools(connector.as_ref(), &launch).await?;
        print!("{}", ConsoleFormatter::tool_list(&registry));
        return Ok(ExitCode::SUCCESS);
    }

    // === Dependency Injection ===
    let settings = config.engine.to_settings()?;
    let engine = Arc::new(OpenAiReasoningEngine::new(settings)?);

    let cancellation = CancellationToken::new();
    spawn_interrupt_handler(cancellation.clone());

    let use_case = RunChatUseCase::new(connector, engine)
        .with_progress(progress_for(&cli, &config))
        .with_conversation_logger(conversation_logger(&config))
        .with_cancellation(cancellation);

    let input = RunChatInput::new(launch, config.chat.to_chat_params());

    // === One-shot mode ===
    if let Some(prompt) = &cli.prompt {
        let mut operator = OneShotOperator::new(prompt.clone());
        use_case.execute(input, &mut operator).await?;
        return Ok(if operator.succeeded() {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        });
    }

    // === Interactive mode ===
    let history_path = config.chat.history_file.clone().or_else(default_history_path);
    let mut repl = ChatRepl::new(history_path).context("Failed to initialize line editor")?;

    let output = use_case.execute(input, &mut repl).await?;
    info!(
        "Session ended ({}) after {} message(s)",
        output.close_reason.as_str(),
        output.message_count
    );

    Ok(ExitCode::SUCCESS)
}

/// Install the tracing subscriber. Verbosity picks the level unless
/// `RUST_LOG` is set; a log file replaces stderr output.
fn init_logging(verbose: u8, log_file: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace", // -vvv or more
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    match log_file {
        Some(path) => {
            let file_name = path
                .file_name()
                .with_context(|| format!("Invalid log file path: {}", path.display()))?;
            let dir = match path.parent() {
                Some(parent) if !parent.as_os_str().is_empty() => parent,
                _ => Path::new("."),
            };
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create log directory {}", dir.display()))?;

            let appender = tracing_appender::rolling::never(dir, file_name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(writer)
                .with_ansi(false)
                .init();
            Ok(Some(guard))
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
            Ok(None)
        }
    }
}

/// Ctrl-C outside the prompt cancels the running turn; a second one exits.
fn spawn_interrupt_handler(token: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_err() {
            return;
        }
        eprintln!("Interrupted; finishing the current step (Ctrl-C again to force exit)");
        token.cancel();

        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Second interrupt; exiting");
            std::process::exit(130);
        }
    });
}

fn progress_for(cli: &Cli, config: &FileConfig) -> Arc<dyn TurnProgressNotifier> {
    if cli.quiet || !config.chat.show_progress {
        Arc::new(NoProgress)
    } else {
        Arc::new(ProgressReporter::new())
    }
}

fn conversation_logger(config: &FileConfig) -> Arc<dyn ConversationLogger> {
    let Some(path) = &config.logging.conversation_log else {
        return Arc::new(NoConversationLogger);
    };
    match JsonlConversationLogger::open(path) {
        Ok(logger) => {
            info!(
                "Conversation log: {} (session {})",
                logger.path().display(),
                logger.session_id()
            );
            Arc::new(logger)
        }
        Err(e) => {
            warn!(
                "Could not open conversation log {}: {}; continuing without it",
                path.display(),
                e
            );
            Arc::new(NoConversationLogger)
        }
    }
}
