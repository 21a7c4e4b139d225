//! Settings for a monitored mail server
//!
//! Stored in `config.toml`:
//!
//! ```toml
//! hostname = "mail.example.com"
//! username = "admin"
//! password = "..."
//! accounts = ["alice@example.com", "bob@example.com"]
//!
//! [polling]
//! scan_interval_secs = 3600
//! ```

use std::fmt;

use secrecy::SecretString;
use serde::{Deserialize, Deserializer, Serialize};

use crate::client::{ConnectionParameters, DEFAULT_SSH_PORT};
use crate::error::{ConfigError, ConfigResult};

/// Default polling interval (one hour)
pub const DEFAULT_SCAN_INTERVAL_SECS: u32 = 3600;

/// Shortest allowed polling interval
pub const MIN_SCAN_INTERVAL_SECS: u32 = 60;

/// Longest allowed polling interval (one day)
pub const MAX_SCAN_INTERVAL_SECS: u32 = 86_400;

/// Polling behaviour (stored under `[polling]`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollSettings {
    /// Seconds between refreshes (60–86400, default: 3600)
    #[serde(default = "default_scan_interval_secs")]
    pub scan_interval_secs: u32,
    /// Consecutive failed refreshes before the data is reported unavailable
    #[serde(default = "default_max_consecutive_errors")]
    pub max_consecutive_errors: u32,
}

const fn default_scan_interval_secs() -> u32 {
    DEFAULT_SCAN_INTERVAL_SECS
}

const fn default_max_consecutive_errors() -> u32 {
    3
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            scan_interval_secs: default_scan_interval_secs(),
            max_consecutive_errors: default_max_consecutive_errors(),
        }
    }
}

impl PollSettings {
    /// Returns the interval clamped to the valid range
    #[must_use]
    pub const fn effective_interval_secs(&self) -> u32 {
        if self.scan_interval_secs < MIN_SCAN_INTERVAL_SECS {
            MIN_SCAN_INTERVAL_SECS
        } else if self.scan_interval_secs > MAX_SCAN_INTERVAL_SECS {
            MAX_SCAN_INTERVAL_SECS
        } else {
            self.scan_interval_secs
        }
    }

    /// Returns the error threshold, at least 1
    #[must_use]
    pub const fn effective_max_errors(&self) -> u32 {
        if self.max_consecutive_errors == 0 {
            1
        } else {
            self.max_consecutive_errors
        }
    }
}

/// Connection and account selection for one mail server
#[derive(Clone, Deserialize)]
pub struct QuotaConfig {
    /// Mail server host name or address
    pub hostname: String,
    /// SSH port
    #[serde(default = "default_port")]
    pub port: u16,
    /// SSH login name
    pub username: String,
    /// SSH password; omit to use keys or the SSH agent
    #[serde(default, deserialize_with = "deserialize_secret")]
    pub password: Option<SecretString>,
    /// Private key for public-key authentication (`~` is expanded)
    #[serde(default)]
    pub identity_file: Option<String>,
    /// Accounts to report; empty means every account on the server
    #[serde(default)]
    pub accounts: Vec<String>,
    /// Polling behaviour
    #[serde(default)]
    pub polling: PollSettings,
}

const fn default_port() -> u16 {
    DEFAULT_SSH_PORT
}

fn deserialize_secret<'de, D>(deserializer: D) -> Result<Option<SecretString>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?
        .filter(|s| !s.is_empty())
        .map(SecretString::from))
}

impl fmt::Debug for QuotaConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuotaConfig")
            .field("hostname", &self.hostname)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .field("identity_file", &self.identity_file)
            .field("accounts", &self.accounts)
            .field("polling", &self.polling)
            .finish()
    }
}

impl QuotaConfig {
    /// Creates a configuration with default port and polling settings
    #[must_use]
    pub fn new(hostname: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            hostname: hostname.into(),
            port: DEFAULT_SSH_PORT,
            username: username.into(),
            password: None,
            identity_file: None,
            accounts: Vec::new(),
            polling: PollSettings::default(),
        }
    }

    /// Checks that the required fields are usable
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] naming the first bad field.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.hostname.trim().is_empty() {
            return Err(ConfigError::Validation {
                field: "hostname".into(),
                reason: "must not be empty".into(),
            });
        }
        if self.hostname.chars().any(char::is_whitespace) {
            return Err(ConfigError::Validation {
                field: "hostname".into(),
                reason: "must not contain whitespace".into(),
            });
        }
        if self.username.trim().is_empty() {
            return Err(ConfigError::Validation {
                field: "username".into(),
                reason: "must not be empty".into(),
            });
        }
        if self.port == 0 {
            return Err(ConfigError::Validation {
                field: "port".into(),
                reason: "must be between 1 and 65535".into(),
            });
        }
        Ok(())
    }

    /// Builds the SSH connection parameters, expanding `~` and environment
    /// variables in the identity file path
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] if the configuration is invalid or
    /// the identity file path cannot be expanded.
    pub fn connection_parameters(&self) -> ConfigResult<ConnectionParameters> {
        self.validate()?;

        let mut params = ConnectionParameters::without_password(&self.hostname, &self.username)
            .with_port(self.port)
            .with_password(self.password.clone());

        if let Some(ref path) = self.identity_file {
            let expanded = shellexpand::full(path).map_err(|e| ConfigError::Validation {
                field: "identity_file".into(),
                reason: e.to_string(),
            })?;
            params = params.with_identity_file(expanded.into_owned());
        }

        Ok(params)
    }

    /// Whether an account should be reported (all accounts when none are
    /// selected)
    #[must_use]
    pub fn is_selected(&self, account: &str) -> bool {
        self.accounts.is_empty() || self.accounts.iter().any(|a| a == account)
    }
}
