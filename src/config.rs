//! Run configuration.
//!
//! Defaults for a run can be kept in a TOML file so frequently used
//! exclusions and extension choices do not have to be typed each time.
//! Command-line values are merged on top of the file (see [`CopyConfig::merge_cli`]).
//!
//! # Configuration File Format
//!
//! ```toml
//! [copy]
//! exclude = [".temp", "-edited", ".json"]
//! extensions = ["jpg", "heic", "mp4"]
//! progress = true
//! log_file = "/home/me/extcopy.log"
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the per-directory configuration file.
pub const LOCAL_CONFIG_FILE: &str = ".extcopyrc.toml";

/// Errors that can occur during configuration loading.
#[derive(Debug, Clone)]
pub enum ConfigError {
    /// Configuration file not found at the specified path.
    ConfigNotFound(PathBuf),
    /// Invalid TOML syntax or structure.
    ConfigInvalid(String),
    /// IO error while reading configuration.
    IoError(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::ConfigNotFound(path) => {
                write!(f, "Configuration file not found: {}", path.display())
            }
            ConfigError::ConfigInvalid(msg) => write!(f, "Invalid configuration: {}", msg),
            ConfigError::IoError(msg) => write!(f, "IO error reading configuration: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Top-level configuration document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CopyConfig {
    #[serde(default)]
    pub copy: CopySettings,
}

/// Settings under the `[copy]` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CopySettings {
    /// Substrings that exclude a file when found in its name.
    #[serde(default)]
    pub exclude: Vec<String>,

    /// Extensions to copy. Empty means every extension.
    #[serde(default)]
    pub extensions: Vec<String>,

    /// Whether to draw the progress bar. Defaults to true.
    #[serde(default = "default_progress")]
    pub progress: bool,

    /// File that receives one line per processed file.
    #[serde(default)]
    pub log_file: Option<PathBuf>,
}

/// Helper function for default value of `progress`.
fn default_progress() -> bool {
    true
}

impl Default for CopySettings {
    fn default() -> Self {
        Self {
            exclude: Vec::new(),
            extensions: Vec::new(),
            progress: default_progress(),
            log_file: None,
        }
    }
}

impl CopyConfig {
    /// Load configuration from a file, with fallback to defaults.
    ///
    /// Attempts to load configuration in the following order:
    /// 1. If `config_path` is provided, load from that file
    /// 2. Look for `.extcopyrc.toml` in the current directory
    /// 3. Look for `~/.config/extcopy/config.toml` in home directory
    /// 4. Fall back to default configuration
    ///
    /// # Errors
    ///
    /// Returns an error if a configuration file is explicitly provided but cannot be read,
    /// or if a discovered file is not valid TOML.
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = config_path {
            return Self::load_from_file(path);
        }

        let local_config = PathBuf::from(LOCAL_CONFIG_FILE);
        if local_config.exists() {
            return Self::load_from_file(&local_config);
        }

        if let Ok(home) = std::env::var("HOME") {
            let home_config = PathBuf::from(home)
                .join(".config")
                .join("extcopy")
                .join("config.toml");
            if home_config.exists() {
                return Self::load_from_file(&home_config);
            }
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ConfigNotFound` if file does not exist.
    /// Returns `ConfigError::ConfigInvalid` if TOML parsing fails.
    /// Returns `ConfigError::IoError` if file cannot be read.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::ConfigNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;

        let config: Self =
            toml::from_str(&content).map_err(|e| ConfigError::ConfigInvalid(e.to_string()))?;
        tracing::debug!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    /// Merges command-line values into this configuration.
    ///
    /// Exclusions accumulate; a non-empty extension list from the command line
    /// replaces the configured one; an explicit log file wins; `--no-progress`
    /// turns the bar off.
    pub fn merge_cli(
        mut self,
        exclude: &[String],
        extensions: &[String],
        log_file: Option<&Path>,
        no_progress: bool,
    ) -> Self {
        self.copy.exclude.extend(exclude.iter().cloned());
        if !extensions.is_empty() {
            self.copy.extensions = extensions.to_vec();
        }
        if let Some(path) = log_file {
            self.copy.log_file = Some(path.to_path_buf());
        }
        if no_progress {
            self.copy.progress = false;
        }
        self
    }
}
