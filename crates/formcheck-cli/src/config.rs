//! Configuration management for the CLI
//!
//! This module handles loading configuration from:
//! - Default values
//! - Configuration files (YAML, JSON or TOML)
//! - Environment variables (through clap and the logging setup)
//! - Command-line arguments

use crate::error::{Error, Result};
use crate::logging::LogFormat;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Where uploaded files are stored
    pub storage: StorageConfig,

    /// Display text used in failure messages
    pub dictionary: DictionaryConfig,

    /// Documents backing `fromModel` option lists
    pub sources: SourcesConfig,

    /// Output settings
    pub output: OutputConfig,

    /// Logging settings
    pub logging: LoggingConfig,
}

/// Upload storage configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory the `files/uploads/` tree is created in
    pub upload_root: PathBuf,

    /// Replace existing files instead of refusing the upload
    pub allow_overwrite: bool,
}

/// Dictionary configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DictionaryConfig {
    /// Dictionary file, merged over the built-in English messages
    pub path: Option<PathBuf>,

    /// Labels are dictionary keys
    pub localize_labels: bool,
}

/// Option source configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourcesConfig {
    /// Rows per model name, used by `fromModel` fields
    pub option_rows: Option<PathBuf>,
}

/// Output configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Use colored output by default
    pub color: bool,

    /// Redact sensitive values in printed submissions
    pub redact: bool,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level used when no verbosity flag is given
    pub level: String,

    /// Log format (compact, full, json)
    pub format: LogFormat,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            upload_root: PathBuf::from("."),
            allow_overwrite: false,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            color: true,
            redact: true,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            format: LogFormat::Compact,
        }
    }
}

/// Serialization format of a document, picked from its extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Json,
    Yaml,
    Toml,
}

impl DocumentFormat {
    /// Format of a path; anything unrecognized is read as JSON
    pub fn of(path: &Path) -> Self {
        match path.extension().and_then(|s| s.to_str()) {
            Some("yaml") | Some("yml") => Self::Yaml,
            Some("toml") => Self::Toml,
            _ => Self::Json,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Json => "JSON",
            Self::Yaml => "YAML",
            Self::Toml => "TOML",
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let content = std::fs::read_to_string(path)?;
        let format = DocumentFormat::of(path);

        let parsed = match format {
            DocumentFormat::Yaml => serde_yaml::from_str(&content).map_err(|e| e.to_string()),
            DocumentFormat::Toml => toml::from_str(&content).map_err(|e| e.to_string()),
            DocumentFormat::Json => serde_json::from_str(&content).map_err(|e| e.to_string()),
        };

        parsed.map_err(|reason| Error::InvalidFormat {
            path: path.to_path_buf(),
            expected: format.name().to_string(),
            reason,
        })
    }

    /// Load configuration from default locations
    pub fn load() -> Result<Self> {
        for path in Self::default_config_paths() {
            if path.exists() {
                match Self::from_file(&path) {
                    Ok(config) => {
                        debug!(path = %path.display(), "configuration loaded");
                        return Ok(config);
                    }
                    Err(e) => {
                        warn!("Failed to load config from {}: {}", path.display(), e);
                    }
                }
            }
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file or default locations
    pub fn load_with_file(file: Option<&Path>) -> Result<Self> {
        match file {
            Some(path) => Self::from_file(path),
            None => Self::load(),
        }
    }

    /// Project configuration file created by `config init`
    pub fn project_config_path() -> PathBuf {
        PathBuf::from(".formcheck.yaml")
    }

    /// User configuration file
    pub fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("formcheck").join("config.yaml"))
    }

    /// Configuration file paths to check, in order
    pub fn default_config_paths() -> Vec<PathBuf> {
        let mut paths = vec![
            Self::project_config_path(),
            PathBuf::from(".formcheck.json"),
            PathBuf::from(".formcheck.toml"),
        ];

        if let Some(user) = Self::user_config_path() {
            paths.push(user);
        }

        if let Some(home_dir) = dirs::home_dir() {
            paths.push(home_dir.join(".formcheck.yaml"));
        }

        paths
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = match DocumentFormat::of(path) {
            DocumentFormat::Yaml => serde_yaml::to_string(self)?,
            DocumentFormat::Toml => toml::to_string_pretty(self)?,
            DocumentFormat::Json => serde_json::to_string_pretty(self)?,
        };

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        std::fs::write(path, content)?;
        Ok(())
    }
}

/// Builder for creating configurations programmatically
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    pub fn upload_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.config.storage.upload_root = root.into();
        self
    }

    pub fn allow_overwrite(mut self, allow: bool) -> Self {
        self.config.storage.allow_overwrite = allow;
        self
    }

    pub fn dictionary(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.dictionary.path = Some(path.into());
        self
    }

    pub fn localize_labels(mut self, localize: bool) -> Self {
        self.config.dictionary.localize_labels = localize;
        self
    }

    pub fn option_rows(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.sources.option_rows = Some(path.into());
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.storage.upload_root, PathBuf::from("."));
        assert!(!config.storage.allow_overwrite);
        assert!(config.output.redact);
        assert_eq!(config.logging.format, LogFormat::Compact);
    }

    #[test]
    fn test_save_and_reload_each_format() {
        let dir = tempdir().unwrap();
        let config = ConfigBuilder::new()
            .upload_root(dir.path().join("store"))
            .dictionary("lang/en.yaml")
            .localize_labels(true)
            .build();

        for name in ["config.yaml", "config.json", "config.toml"] {
            let path = dir.path().join("nested").join(name);
            config.save(&path).unwrap();
            assert_eq!(Config::from_file(&path).unwrap(), config, "{}", name);
        }
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("partial.yaml");
        std::fs::write(&path, "storage:\n  allow_overwrite: true\n").unwrap();

        let config = Config::from_file(&path).unwrap();
        assert!(config.storage.allow_overwrite);
        assert_eq!(config.storage.upload_root, PathBuf::from("."));
        assert!(config.dictionary.path.is_none());
    }

    #[test]
    fn test_invalid_and_missing_files() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            Config::from_file(&path),
            Err(Error::InvalidFormat { .. })
        ));
        assert!(matches!(
            Config::from_file(&dir.path().join("absent.yaml")),
            Err(Error::FileNotFound { .. })
        ));
    }

    #[test]
    fn test_document_format() {
        assert_eq!(DocumentFormat::of(Path::new("a.yml")), DocumentFormat::Yaml);
        assert_eq!(DocumentFormat::of(Path::new("a.toml")), DocumentFormat::Toml);
        assert_eq!(DocumentFormat::of(Path::new("a.json")), DocumentFormat::Json);
        assert_eq!(DocumentFormat::of(Path::new("a")), DocumentFormat::Json);
    }
}
