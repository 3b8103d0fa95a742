//! CLI command definitions

use clap::Parser;
use std::path::PathBuf;

/// CLI arguments for toolbridge
#[derive(Parser, Debug)]
#[command(name = "toolbridge")]
#[command(author, version, about = "Chat with an LLM that can call tools on an MCP server")]
#[command(long_about = r#"
toolbridge launches an MCP tool server over stdio, discovers its tools, and
runs a chat loop in which the model may call those tools before answering.

By default it runs `npx firecrawl-mcp` with FIRECRAWL_API_KEY passed through,
and talks to gpt-4 using OPENAI_API_KEY.

Configuration files are loaded from (in priority order):
1. TOOLBRIDGE_* environment variables (e.g. TOOLBRIDGE_ENGINE__MODEL)
2. --config <path>        Explicit config file
3. ./toolbridge.toml      Project-level config
4. ~/.config/toolbridge/config.toml   Global config

Example:
  toolbridge
  toolbridge --tools
  toolbridge -p "Summarize https://www.rust-lang.org"
"#)]
pub struct Cli {
    /// Run a single prompt non-interactively and print the answer
    #[arg(short, long, value_name = "TEXT")]
    pub prompt: Option<String>,

    /// List the tool server's tools and exit
    #[arg(long)]
    pub tools: bool,

    /// Override the model name
    #[arg(short, long, value_name = "MODEL")]
    pub model: Option<String>,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress progress indicators
    #[arg(short, long)]
    pub quiet: bool,

    /// Write diagnostic logs to this file instead of stderr
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Path to configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long)]
    pub no_config: bool,

    /// Show configuration file locations and exit
    #[arg(long)]
    pub show_config: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_one_shot() {
        let cli = Cli::parse_from(["toolbridge", "-vv", "-p", "hello", "--model", "gpt-4o"]);

        assert_eq!(cli.prompt.as_deref(), Some("hello"));
        assert_eq!(cli.model.as_deref(), Some("gpt-4o"));
        assert_eq!(cli.verbose, 2);
        assert!(!cli.tools);
    }
}
