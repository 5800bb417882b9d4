//! Configuration File Loading
//!
//! Looks for `runbook.toml` / `runbook.json` in the working directory, then
//! `config.toml` / `config.json` under the user configuration directory
//! (`$XDG_CONFIG_HOME/runbook` on Linux). The first file that parses wins;
//! without one the defaults are used.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use super::Config;
use crate::error::{Error, Result};

/// Supported configuration file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Toml,
    Json,
}

impl ConfigFormat {
    pub const ALL: [ConfigFormat; 2] = [ConfigFormat::Toml, ConfigFormat::Json];

    pub fn extension(&self) -> &'static str {
        match self {
            ConfigFormat::Toml => "toml",
            ConfigFormat::Json => "json",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ConfigFormat::Toml => "TOML",
            ConfigFormat::Json => "JSON",
        }
    }

    /// Format implied by the file extension; TOML when unknown.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => ConfigFormat::Json,
            _ => ConfigFormat::Toml,
        }
    }
}

/// Configuration file loader
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    /// Base paths, tried with every format extension in order
    search_paths: Vec<PathBuf>,
    /// Path of the file the last successful load came from
    current_path: Option<PathBuf>,
}

impl ConfigLoader {
    /// Loader over the default search paths
    pub fn new() -> Self {
        Self {
            search_paths: Self::default_search_paths(),
            current_path: None,
        }
    }

    /// Load from the default search paths, falling back to defaults.
    pub fn load() -> Result<Config> {
        Self::new().find_and_load()
    }

    /// Load and validate one specific file.
    pub fn load_from(path: &Path) -> Result<Config> {
        let config = Self::parse_file(path, ConfigFormat::from_path(path))?;
        Self::validate(&config)?;
        Ok(config)
    }

    /// Try every search path; unparseable files are reported and skipped.
    pub fn find_and_load(&mut self) -> Result<Config> {
        for base in &self.search_paths {
            for format in ConfigFormat::ALL {
                let path = base.with_extension(format.extension());
                if !path.exists() {
                    continue;
                }

                match Self::parse_file(&path, format) {
                    Ok(config) => {
                        debug!("Loaded configuration from {}", path.display());
                        Self::validate(&config)?;
                        self.current_path = Some(path);
                        return Ok(config);
                    }
                    Err(e) => {
                        warn!("Failed to load config from {}: {}", path.display(), e);
                    }
                }
            }
        }

        debug!("No configuration file found, using defaults");
        let config = Config::default();
        Self::validate(&config)?;
        Ok(config)
    }

    /// Write `config` to `path` in the format implied by its extension.
    pub fn save_to_path(config: &Config, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let format = ConfigFormat::from_path(path);
        let serialize_failed = |reason: String| Error::ConfigParseFailed {
            format: format.name().to_string(),
            reason,
        };
        let content = match format {
            ConfigFormat::Json => {
                serde_json::to_string_pretty(config).map_err(|e| serialize_failed(e.to_string()))?
            }
            ConfigFormat::Toml => {
                toml::to_string_pretty(config).map_err(|e| serialize_failed(e.to_string()))?
            }
        };

        fs::write(path, content)?;
        Ok(())
    }

    fn parse_file(path: &Path, format: ConfigFormat) -> Result<Config> {
        let content = fs::read_to_string(path).map_err(|e| Error::ConfigLoadFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let parse_failed = |reason: String| Error::ConfigParseFailed {
            format: format.name().to_string(),
            reason,
        };
        match format {
            ConfigFormat::Toml => toml::from_str(&content).map_err(|e| parse_failed(e.to_string())),
            ConfigFormat::Json => {
                serde_json::from_str(&content).map_err(|e| parse_failed(e.to_string()))
            }
        }
    }

    /// Validate configuration
    pub fn validate(config: &Config) -> Result<()> {
        if config.shell.interpreter.is_empty()
            || config.shell.interpreter.iter().any(|arg| arg.is_empty())
        {
            return Err(Error::ConfigValidationFailed {
                field: "shell.interpreter".to_string(),
                reason: "Interpreter cannot be empty".to_string(),
            });
        }

        if !(0..=255).contains(&config.runner.timeout_exit_code) {
            return Err(Error::ConfigValidationFailed {
                field: "runner.timeout_exit_code".to_string(),
                reason: "Exit code must be between 0 and 255".to_string(),
            });
        }

        if config.runner.name.trim().is_empty() {
            return Err(Error::ConfigValidationFailed {
                field: "runner.name".to_string(),
                reason: "Runner name cannot be empty".to_string(),
            });
        }

        Ok(())
    }

    fn default_search_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();

        if let Ok(cwd) = env::current_dir() {
            paths.push(cwd.join("runbook"));
        }

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("runbook").join("config"));
        }

        paths
    }

    /// Get the path of the last loaded configuration file
    pub fn current_path(&self) -> Option<&Path> {
        self.current_path.as_deref()
    }

    /// List all search paths
    pub fn search_paths(&self) -> &[PathBuf] {
        &self.search_paths
    }

    /// Add a custom search path (without extension)
    pub fn add_search_path(&mut self, path: PathBuf) {
        self.search_paths.push(path);
    }

    /// Clear all search paths and add a single path
    pub fn set_search_path(&mut self, path: PathBuf) {
        self.search_paths = vec![path];
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}
