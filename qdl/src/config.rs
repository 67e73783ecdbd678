//! Configuration for QDL tools.
//!
//! Config directory resolution order:
//! 1. Explicit path passed to Config::load_from()
//! 2. QDL_CONFIG_DIR environment variable
//! 3. Platform config directory (e.g. ~/.config/qdl)

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::query::{ParseOptions, TrailingContent};
use crate::{Error, Result};

/// Environment variable overriding the config directory.
pub const QDL_CONFIG_DIR_VAR: &str = "QDL_CONFIG_DIR";

/// QDL configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Directory holding config.toml. Not persisted.
    #[serde(skip)]
    pub config_dir: PathBuf,

    /// Policy for input left after the top-level clauses.
    #[serde(default)]
    pub trailing_content: TrailingPolicy,

    /// Default output format for parsed queries.
    #[serde(default)]
    pub output: OutputFormat,

    /// Pretty-print JSON output.
    #[serde(default = "default_pretty_json")]
    pub pretty_json: bool,
}

/// Trailing content policy as written in config.toml.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrailingPolicy {
    #[default]
    Reject,
    Ignore,
}

/// How the CLI prints a parsed query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Canonical query text.
    #[default]
    Text,
    /// JSON rendering of the query model.
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            other => Err(Error::Config(format!("Unknown output format: {}", other))),
        }
    }
}

fn default_pretty_json() -> bool {
    true
}

impl Config {
    /// Create a default config rooted at `config_dir`.
    pub fn with_dir(config_dir: impl Into<PathBuf>) -> Self {
        Self {
            config_dir: config_dir.into(),
            trailing_content: TrailingPolicy::default(),
            output: OutputFormat::default(),
            pretty_json: default_pretty_json(),
        }
    }

    /// Load config from the resolved config directory, or use defaults.
    pub fn load() -> Result<Self> {
        let config_dir = resolve_config_dir()?;
        Self::load_from(&config_dir)
    }

    /// Load config from `config_dir/config.toml`, or use defaults if absent.
    pub fn load_from(config_dir: &Path) -> Result<Self> {
        let config_path = config_dir.join("config.toml");

        if config_path.exists() {
            let contents = std::fs::read_to_string(&config_path)?;
            let mut config: Config = toml::from_str(&contents)
                .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))?;
            config.config_dir = config_dir.to_path_buf();
            log::debug!("loaded config from {}", config_path.display());
            Ok(config)
        } else {
            Ok(Self::with_dir(config_dir))
        }
    }

    /// Save config to `config_dir/config.toml`, creating the directory.
    pub fn save(&self) -> Result<()> {
        std::fs::create_dir_all(&self.config_dir)?;
        std::fs::write(self.config_path(), self.to_toml()?)?;
        Ok(())
    }

    /// Render the persisted settings as TOML.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))
    }

    /// Path to the config file.
    pub fn config_path(&self) -> PathBuf {
        self.config_dir.join("config.toml")
    }

    /// Parser settings implied by this config.
    pub fn parse_options(&self) -> ParseOptions {
        ParseOptions {
            trailing: match self.trailing_content {
                TrailingPolicy::Reject => TrailingContent::Reject,
                TrailingPolicy::Ignore => TrailingContent::Ignore,
            },
        }
    }
}

/// Resolve the config directory using the standard resolution order.
fn resolve_config_dir() -> Result<PathBuf> {
    // 1. Environment variable
    if let Ok(path) = std::env::var(QDL_CONFIG_DIR_VAR) {
        return Ok(PathBuf::from(path));
    }

    // 2. XDG config directory (via directories crate)
    if let Some(proj_dirs) = ProjectDirs::from("", "", "qdl") {
        return Ok(proj_dirs.config_dir().to_path_buf());
    }

    // 3. Fallback to ~/.config/qdl
    let home = std::env::var("HOME")
        .map_err(|_| Error::Config("Could not determine home directory".to_string()))?;
    Ok(PathBuf::from(home).join(".config/qdl"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_config_defaults() {
        let config = Config::with_dir("/tmp/test-qdl");
        assert_eq!(config.config_path(), PathBuf::from("/tmp/test-qdl/config.toml"));
        assert_eq!(config.trailing_content, TrailingPolicy::Reject);
        assert_eq!(config.output, OutputFormat::Text);
        assert!(config.pretty_json);
        assert_eq!(config.parse_options(), ParseOptions::default());
    }

    #[test]
    fn test_config_missing_file_uses_defaults() {
        let tmp = TempDir::new().unwrap();
        let config = Config::load_from(tmp.path()).unwrap();
        assert_eq!(config, Config::with_dir(tmp.path()));
    }

    #[test]
    fn test_config_save_load() {
        let tmp = TempDir::new().unwrap();
        let config_dir = tmp.path().join("nested/qdl");

        let mut config = Config::with_dir(&config_dir);
        config.trailing_content = TrailingPolicy::Ignore;
        config.output = OutputFormat::Json;
        config.pretty_json = false;
        config.save().unwrap();

        let loaded = Config::load_from(&config_dir).unwrap();
        assert_eq!(loaded, config);
        assert_eq!(loaded.parse_options().trailing, TrailingContent::Ignore);
    }

    #[test]
    fn test_config_partial_file() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("config.toml"), "output = \"json\"\n").unwrap();

        let config = Config::load_from(tmp.path()).unwrap();
        assert_eq!(config.output, OutputFormat::Json);
        assert_eq!(config.trailing_content, TrailingPolicy::Reject);
        assert!(config.pretty_json);
    }

    #[test]
    fn test_config_invalid_file() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("config.toml"), "trailing_content = \"sometimes\"\n").unwrap();

        let err = Config::load_from(tmp.path()).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_output_format_from_str() {
        assert_eq!("json".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert_eq!("text".parse::<OutputFormat>().unwrap(), OutputFormat::Text);
        assert!("yaml".parse::<OutputFormat>().is_err());
    }
}
