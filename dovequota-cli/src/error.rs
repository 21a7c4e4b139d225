//! CLI error types and exit codes.

use dovequota_core::{ClientError, ConfigError, QuotaMonitorError, RefreshCause, RefreshError};

/// Exit codes for CLI operations
pub mod exit_codes {
    /// General error - configuration, parsing, or other non-connection errors
    pub const GENERAL_ERROR: i32 = 1;
    /// The mail server could not be reached
    pub const CANNOT_CONNECT: i32 = 2;
    /// The mail server rejected the credentials
    pub const INVALID_AUTH: i32 = 3;
}

/// CLI error type
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Host unreachable
    #[error("Cannot connect: {0}")]
    CannotConnect(String),

    /// Credentials rejected
    #[error("Invalid authentication: {0}")]
    InvalidAuth(String),

    /// Quota output could not be used
    #[error("Quota error: {0}")]
    Quota(String),

    /// Output serialization error
    #[error("Output error: {0}")]
    Output(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<QuotaMonitorError> for CliError {
    fn from(err: QuotaMonitorError) -> Self {
        match err {
            QuotaMonitorError::Config(e) => Self::Config(e.to_string()),
            QuotaMonitorError::Client(e @ ClientError::Connection { .. }) => {
                Self::CannotConnect(e.to_string())
            }
            QuotaMonitorError::Client(e @ ClientError::Authentication { .. }) => {
                Self::InvalidAuth(e.to_string())
            }
            QuotaMonitorError::Parse(e) => Self::Quota(e.to_string()),
            QuotaMonitorError::Refresh(e) => match e.cause().clone() {
                RefreshCause::Client(client) => QuotaMonitorError::Client(client).into(),
                RefreshCause::Parse(parse) => QuotaMonitorError::Parse(parse).into(),
            },
            QuotaMonitorError::Io(e) => Self::Io(e),
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        QuotaMonitorError::from(err).into()
    }
}

impl From<ClientError> for CliError {
    fn from(err: ClientError) -> Self {
        QuotaMonitorError::from(err).into()
    }
}

impl From<RefreshError> for CliError {
    fn from(err: RefreshError) -> Self {
        QuotaMonitorError::from(err).into()
    }
}

impl CliError {
    /// Returns the appropriate exit code for this error type.
    ///
    /// Exit codes:
    /// - 0: Success (not an error)
    /// - 1: General error (configuration, parsing, output, IO)
    /// - 2: Cannot connect
    /// - 3: Invalid authentication
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::CannotConnect(_) => exit_codes::CANNOT_CONNECT,
            Self::InvalidAuth(_) => exit_codes::INVALID_AUTH,
            Self::Config(_)
            | Self::Quota(_)
            | Self::Output(_)
            | Self::Io(_) => exit_codes::GENERAL_ERROR,
        }
    }
}
