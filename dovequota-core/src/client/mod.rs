//! Remote command execution against the mail server
//!
//! [`RemoteQuotaClient`] is the seam between the refresh pipeline and the
//! transport. The production implementation, [`SshQuotaClient`], runs the
//! system `ssh` client; tests substitute scripted implementations.

mod params;
mod ssh;

use async_trait::async_trait;

pub use params::{ConnectionParameters, DEFAULT_SSH_PORT};
pub use ssh::{SSH_CONNECT_TIMEOUT_SECS, SshQuotaClient, classify_ssh_failure};

use crate::error::ClientResult;

/// Executes commands on the remote mail server
///
/// Every call opens and tears down its own session. Implementations hold no
/// mutable state between calls.
#[async_trait]
pub trait RemoteQuotaClient: Send + Sync {
    /// Opens a session and closes it again without running anything useful.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::ClientError::Connection`] if the host cannot be
    /// reached, or [`crate::error::ClientError::Authentication`] if the
    /// credentials are rejected.
    async fn test_connection(&self) -> ClientResult<()>;

    /// Runs `command` non-interactively and returns everything it wrote to
    /// stdout (possibly empty).
    ///
    /// # Errors
    ///
    /// Same conditions as [`Self::test_connection`].
    async fn execute_command(&self, command: &str) -> ClientResult<String>;

    /// Host name, for diagnostics
    fn host(&self) -> &str;
}
