//! SSH connection parameters

use std::fmt;
use std::path::PathBuf;

use secrecy::SecretString;

/// Default SSH port
pub const DEFAULT_SSH_PORT: u16 = 22;

/// Where and how to log in to the mail server
///
/// Immutable once built. The password is held as a [`SecretString`] and is
/// redacted from `Debug` output.
#[derive(Clone)]
pub struct ConnectionParameters {
    host: String,
    port: u16,
    username: String,
    password: Option<SecretString>,
    identity_file: Option<PathBuf>,
}

impl ConnectionParameters {
    /// Creates parameters for password authentication on port 22
    #[must_use]
    pub fn new(
        host: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<SecretString>,
    ) -> Self {
        Self {
            host: host.into(),
            port: DEFAULT_SSH_PORT,
            username: username.into(),
            password: Some(password.into()),
            identity_file: None,
        }
    }

    /// Creates parameters that rely on keys or the SSH agent
    #[must_use]
    pub fn without_password(host: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: DEFAULT_SSH_PORT,
            username: username.into(),
            password: None,
            identity_file: None,
        }
    }

    /// Sets the SSH port
    #[must_use]
    pub const fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Sets the private key used for public-key authentication
    #[must_use]
    pub fn with_identity_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.identity_file = Some(path.into());
        self
    }

    /// Replaces the password
    #[must_use]
    pub fn with_password(mut self, password: Option<SecretString>) -> Self {
        self.password = password;
        self
    }

    /// Remote host name or address
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// SSH port
    #[must_use]
    pub const fn port(&self) -> u16 {
        self.port
    }

    /// Login name
    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Password, if password authentication is configured
    #[must_use]
    pub const fn password(&self) -> Option<&SecretString> {
        self.password.as_ref()
    }

    /// Private key path, if configured
    #[must_use]
    pub fn identity_file(&self) -> Option<&std::path::Path> {
        self.identity_file.as_deref()
    }

    /// `user@host` destination for the `ssh` command line
    #[must_use]
    pub fn destination(&self) -> String {
        format!("{}@{}", self.username, self.host)
    }
}

impl fmt::Debug for ConnectionParameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionParameters")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .field("identity_file", &self.identity_file)
            .finish()
    }
}
