//! Error types for the quota monitoring pipeline
//!
//! Each stage has its own error enum: the SSH client raises [`ClientError`],
//! the output parser raises [`ParseError`], and the refresh coordinator wraps
//! both into a single [`RefreshError`] for its owner.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while talking to the remote mail server
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// Host unreachable, name resolution failure, timeout or rejected host key
    #[error("Cannot connect to {host}: {reason}")]
    Connection {
        /// Remote host the session was opened against
        host: String,
        /// Human-readable cause
        reason: String,
    },

    /// The server rejected the supplied credentials
    #[error("Authentication failed for {username}@{host}: {reason}")]
    Authentication {
        /// Remote host the session was opened against
        host: String,
        /// Login name that was rejected
        username: String,
        /// Human-readable cause
        reason: String,
    },
}

impl ClientError {
    /// Short machine-readable key used by the setup flow
    /// (`cannot_connect` or `invalid_auth`)
    #[must_use]
    pub const fn reason_key(&self) -> &'static str {
        match self {
            Self::Connection { .. } => "cannot_connect",
            Self::Authentication { .. } => "invalid_auth",
        }
    }

    /// Returns true if the credentials were rejected
    #[must_use]
    pub const fn is_authentication(&self) -> bool {
        matches!(self, Self::Authentication { .. })
    }
}

/// Result type for client operations
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors raised while parsing `doveadm` output
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// A line did not match the seven-column quota layout
    #[error("Malformed quota record '{line}': {reason}")]
    MalformedRecord {
        /// The offending line, verbatim
        line: String,
        /// What was wrong with it
        reason: String,
    },
}

impl ParseError {
    /// Creates a [`ParseError::MalformedRecord`]
    pub fn malformed(line: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedRecord {
            line: line.into(),
            reason: reason.into(),
        }
    }
}

/// Result type for parser operations
pub type ParseResult<T> = Result<T, ParseError>;

/// Underlying cause of a failed refresh
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RefreshCause {
    /// The remote command could not be run
    #[error(transparent)]
    Client(#[from] ClientError),

    /// The command output could not be parsed
    #[error(transparent)]
    Parse(#[from] ParseError),
}

/// Errors surfaced by the refresh coordinator
///
/// Cloneable so that callers coalesced onto the same in-flight refresh all
/// receive the same failure.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RefreshError {
    /// A steady-state refresh failed; the previous snapshot is still current
    #[error("Quota refresh failed: {0}")]
    Failed(RefreshCause),

    /// The first refresh failed; the coordinator is unusable
    #[error("Quota monitor setup failed: {0}")]
    Setup(RefreshCause),
}

impl RefreshError {
    /// Returns the underlying cause
    #[must_use]
    pub const fn cause(&self) -> &RefreshCause {
        match self {
            Self::Failed(cause) | Self::Setup(cause) => cause,
        }
    }

    /// Returns the client error, if the refresh failed at the transport layer
    #[must_use]
    pub const fn client_error(&self) -> Option<&ClientError> {
        match self.cause() {
            RefreshCause::Client(err) => Some(err),
            RefreshCause::Parse(_) => None,
        }
    }
}

/// Result type for refresh operations
pub type RefreshResult<T> = Result<T, RefreshError>;

/// Errors raised while loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file does not exist
    #[error("Configuration file not found: {0}")]
    NotFound(PathBuf),

    /// The configuration file could not be read
    #[error("Failed to read configuration: {0}")]
    Read(String),

    /// The configuration file is not valid TOML for this schema
    #[error("Failed to parse configuration: {0}")]
    Parse(String),

    /// A field holds an unusable value
    #[error("Invalid value for '{field}': {reason}")]
    Validation {
        /// Field name as written in the file
        field: String,
        /// Why it was rejected
        reason: String,
    },

    /// No configuration directory could be determined
    #[error("Could not determine configuration directory")]
    NoConfigDir,
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Umbrella error for library consumers
#[derive(Debug, Error)]
pub enum QuotaMonitorError {
    /// Configuration error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Remote client error
    #[error(transparent)]
    Client(#[from] ClientError),

    /// Parser error
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// Refresh error
    #[error(transparent)]
    Refresh(#[from] RefreshError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
