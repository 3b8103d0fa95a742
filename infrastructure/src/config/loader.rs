//! Configuration file loader with multi-source merging

use super::file_config::FileConfig;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use std::path::{Path, PathBuf};
use thiserror::Error;

const PROJECT_FILENAMES: [&str; 2] = ["toolbridge.toml", ".toolbridge.toml"];
const ENV_PREFIX: &str = "TOOLBRIDGE_";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("invalid configuration: {0}")]
    Extract(#[from] Box<figment::Error>),
}

/// Configuration loader that handles file discovery and merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from all sources with proper priority
    ///
    /// Priority (highest to lowest):
    /// 1. `TOOLBRIDGE_*` environment variables (`__` separates sections)
    /// 2. Explicit config path (if provided)
    /// 3. Project root: `./toolbridge.toml` or `./.toolbridge.toml`
    /// 4. Global: `$XDG_CONFIG_HOME/toolbridge/config.toml`
    /// 5. Default values
    pub fn load(config_path: Option<&PathBuf>) -> Result<FileConfig, ConfigError> {
        let global = Self::global_config_path().filter(|p| p.exists());
        let project = Self::project_config_path();
        Self::load_from(
            global.as_deref(),
            project.as_deref(),
            config_path.map(PathBuf::as_path),
        )
    }

    /// Merge the given files over the defaults, then apply the environment.
    pub fn load_from(
        global: Option<&Path>,
        project: Option<&Path>,
        explicit: Option<&Path>,
    ) -> Result<FileConfig, ConfigError> {
        let mut figment = Figment::new().merge(Serialized::defaults(FileConfig::default()));

        if let Some(path) = global {
            figment = figment.merge(Toml::file(path));
        }
        if let Some(path) = project {
            figment = figment.merge(Toml::file(path));
        }
        if let Some(path) = explicit {
            // A missing explicit file is an operator mistake, not a fallback
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            figment = figment.merge(Toml::file(path));
        }

        figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .map_err(|e| ConfigError::Extract(Box::new(e)))
    }

    /// Load only default configuration (for --no-config)
    pub fn load_defaults() -> FileConfig {
        FileConfig::default()
    }

    /// Get the global config file path
    ///
    /// Returns XDG_CONFIG_HOME/toolbridge/config.toml if set,
    /// otherwise the platform config dir equivalent.
    pub fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("toolbridge").join("config.toml"))
    }

    /// Get the project-level config file path (if it exists)
    pub fn project_config_path() -> Option<PathBuf> {
        PROJECT_FILENAMES
            .iter()
            .map(PathBuf::from)
            .find(|path| path.exists())
    }

    /// Print the config file locations being used (for --show-config)
    pub fn print_config_sources(config_path: Option<&PathBuf>) {
        println!("Configuration sources (in priority order):");

        println!("  [     ] Env:     {}*", ENV_PREFIX);

        if let Some(path) = config_path {
            let mark = if path.exists() { "FOUND" } else { "MISSING" };
            println!("  [{:<5}] Explicit: {}", mark, path.display());
        }

        if let Some(path) = Self::project_config_path() {
            println!("  [FOUND] Project: {}", path.display());
        } else {
            println!("  [     ] Project: ./toolbridge.toml or ./.toolbridge.toml");
        }

        if let Some(path) = Self::global_config_path() {
            if path.exists() {
                println!("  [FOUND] Global:  {}", path.display());
            } else {
                println!("  [     ] Global:  {}", path.display());
            }
        }

        println!("  [     ] Default: built-in defaults");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn toml_file(contents: &str) -> NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_defaults() {
        let config = ConfigLoader::load_defaults();
        assert_eq!(config.engine.model, "gpt-4");
        assert_eq!(config.tool_server.args, vec!["firecrawl-mcp"]);
        assert_eq!(config.chat.max_tool_rounds, 10);
    }

    #[test]
    fn test_global_config_path_returns_some() {
        let path = ConfigLoader::global_config_path();
        assert!(path.is_some());
        assert!(path.unwrap().to_string_lossy().contains("toolbridge"));
    }

    #[test]
    fn test_later_files_override_earlier_ones() {
        let global = toml_file(
            r#"
[engine]
model = "gpt-4o"
temperature = 0.5

[chat]
max_tool_rounds = 3
"#,
        );
        let project = toml_file(
            r#"
[engine]
model = "gpt-4.1"
"#,
        );

        let config =
            ConfigLoader::load_from(Some(global.path()), Some(project.path()), None).unwrap();

        assert_eq!(config.engine.model, "gpt-4.1");
        // Keys absent from the project file fall through to the global file
        assert_eq!(config.engine.temperature, 0.5);
        assert_eq!(config.chat.max_tool_rounds, 3);
        assert_eq!(config.tool_server.command, "npx");
    }

    #[test]
    fn test_explicit_file_has_priority() {
        let project = toml_file("[tool_server]\ncommand = \"node\"\n");
        let explicit = toml_file("[tool_server]\ncommand = \"uvx\"\nargs = [\"mcp-server-fetch\"]\n");

        let config =
            ConfigLoader::load_from(None, Some(project.path()), Some(explicit.path())).unwrap();

        assert_eq!(config.tool_server.command, "uvx");
        assert_eq!(config.tool_server.args, vec!["mcp-server-fetch"]);
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");

        let result = ConfigLoader::load_from(None, None, Some(&missing));

        assert!(matches!(result, Err(ConfigError::NotFound(p)) if p == missing));
    }

    #[test]
    fn test_wrong_type_is_reported() {
        let bad = toml_file("[chat]\nmax_tool_rounds = \"many\"\n");

        let result = ConfigLoader::load_from(None, None, Some(bad.path()));

        assert!(matches!(result, Err(ConfigError::Extract(_))));
    }
}
