//! Configuration management
//!
//! [`ConfigManager`] locates and loads `config.toml`. The file is read-only
//! from this crate's point of view; account selection is written by whatever
//! tool manages the file.

mod settings;

use std::path::{Path, PathBuf};

pub use settings::{
    DEFAULT_SCAN_INTERVAL_SECS, MAX_SCAN_INTERVAL_SECS, MIN_SCAN_INTERVAL_SECS, PollSettings,
    QuotaConfig,
};

use crate::error::{ConfigError, ConfigResult};

/// Directory name under the user's config directory
pub const CONFIG_DIR_NAME: &str = "dovequota";

/// Configuration file name
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Loads configuration from a TOML file
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config_file: PathBuf,
}

impl ConfigManager {
    /// Creates a manager for the default location
    /// (`$XDG_CONFIG_HOME/dovequota/config.toml`)
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NoConfigDir`] if the user's configuration
    /// directory cannot be determined.
    pub fn new() -> ConfigResult<Self> {
        let dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(Self {
            config_file: dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME),
        })
    }

    /// Creates a manager for an explicit file path
    #[must_use]
    pub fn with_config_file(path: impl Into<PathBuf>) -> Self {
        Self {
            config_file: path.into(),
        }
    }

    /// Path of the configuration file
    #[must_use]
    pub fn config_file(&self) -> &Path {
        &self.config_file
    }

    /// Whether the configuration file exists
    #[must_use]
    pub fn exists(&self) -> bool {
        self.config_file.is_file()
    }

    /// Reads, parses and validates the configuration file
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NotFound`] if the file is missing,
    /// [`ConfigError::Read`] on IO failure, [`ConfigError::Parse`] on invalid
    /// TOML and [`ConfigError::Validation`] on unusable values.
    pub fn load(&self) -> ConfigResult<QuotaConfig> {
        let _span = tracing::debug_span!(
            crate::tracing::span_names::CONFIG_LOAD,
            path = %self.config_file.display()
        )
        .entered();

        if !self.config_file.exists() {
            return Err(ConfigError::NotFound(self.config_file.clone()));
        }

        let contents = std::fs::read_to_string(&self.config_file)
            .map_err(|e| ConfigError::Read(format!("{}: {e}", self.config_file.display())))?;

        let config = Self::parse(&contents)?;
        tracing::debug!(
            host = %config.hostname,
            accounts = config.accounts.len(),
            "Configuration loaded"
        );
        Ok(config)
    }

    /// Parses and validates configuration text
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] or [`ConfigError::Validation`].
    pub fn parse(contents: &str) -> ConfigResult<QuotaConfig> {
        let config: QuotaConfig =
            toml::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }
}
