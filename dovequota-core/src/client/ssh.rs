//! SSH command execution via the system `ssh` client
//!
//! Runs commands on the mail server through `ssh` (or `sshpass -e ssh` for
//! password-authenticated connections). Each call spawns its own process, so
//! a session never outlives the operation that opened it.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use tokio::process::Command;
use tracing::Instrument;

use super::{ConnectionParameters, DEFAULT_SSH_PORT, RemoteQuotaClient};
use crate::error::{ClientError, ClientResult};

/// Timeout for establishing the SSH connection (seconds)
pub const SSH_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Time allowed for the remote command once connected (seconds)
const SSH_COMMAND_TIMEOUT_SECS: u64 = 50;

/// `ssh` client binary, resolved through `PATH`
const DEFAULT_SSH_PROGRAM: &str = "ssh";

/// Command used by [`SshQuotaClient::test_connection`]
const NOOP_COMMAND: &str = "true";

/// `sshpass` exit code for a rejected password
const SSHPASS_INVALID_PASSWORD: i32 = 5;

/// `sshpass` exit code for an unknown host key
const SSHPASS_HOST_KEY_UNKNOWN: i32 = 6;

/// `ssh` exit code for connection-level failures
const SSH_ERROR_EXIT: i32 = 255;

/// stderr fragments that indicate rejected credentials
const AUTH_FAILURE_MARKERS: &[&str] = &[
    "Permission denied",
    "Authentication failed",
    "Too many authentication failures",
    "No more authentication methods",
];

/// [`RemoteQuotaClient`] backed by the system `ssh` binary
#[derive(Debug)]
pub struct SshQuotaClient {
    params: ConnectionParameters,
    use_sshpass: bool,
    ssh_program: PathBuf,
    timeout: Duration,
}

impl SshQuotaClient {
    /// Creates a client for the given server.
    ///
    /// Checks once whether `sshpass` is installed. Without it, password
    /// authentication is unavailable and the client falls back to keys or the
    /// SSH agent.
    #[must_use]
    pub fn new(params: ConnectionParameters) -> Self {
        let use_sshpass = params.password().is_some()
            && std::process::Command::new("sshpass")
                .arg("-V")
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .status()
                .is_ok();

        if params.password().is_some() && !use_sshpass {
            tracing::warn!(
                host = %params.host(),
                "sshpass not found, password authentication unavailable; using keys/agent"
            );
        }

        Self {
            params,
            use_sshpass,
            ssh_program: PathBuf::from(DEFAULT_SSH_PROGRAM),
            timeout: Duration::from_secs(SSH_CONNECT_TIMEOUT_SECS + SSH_COMMAND_TIMEOUT_SECS),
        }
    }

    /// Uses another `ssh` binary (a wrapper script or an absolute path)
    #[must_use]
    pub fn with_ssh_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.ssh_program = program.into();
        self
    }

    /// Replaces the overall time budget for one session (connect plus
    /// command, 60 s by default)
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Connection parameters of this client
    #[must_use]
    pub const fn params(&self) -> &ConnectionParameters {
        &self.params
    }

    /// Arguments passed to `ssh` for `remote_command`
    pub(crate) fn ssh_args(&self, remote_command: &str) -> Vec<String> {
        let mut args = Vec::new();

        if !self.use_sshpass {
            // Never prompt; keys or the agent must succeed on their own
            args.extend(["-o".into(), "BatchMode=yes".into()]);
        }
        args.extend([
            "-o".into(),
            "StrictHostKeyChecking=accept-new".into(),
            "-o".into(),
            format!("ConnectTimeout={SSH_CONNECT_TIMEOUT_SECS}"),
            "-o".into(),
            "LogLevel=ERROR".into(),
            "-T".into(),
        ]);

        if self.params.port() != DEFAULT_SSH_PORT {
            args.extend(["-p".into(), self.params.port().to_string()]);
        }

        if let Some(key) = self.params.identity_file() {
            args.extend(["-i".into(), key.display().to_string()]);
        }

        args.push(self.params.destination());
        args.push(remote_command.to_string());
        args
    }

    fn build_command(&self, remote_command: &str) -> Command {
        let mut cmd = if self.use_sshpass {
            let mut cmd = Command::new("sshpass");
            cmd.arg("-e").arg(&self.ssh_program);
            // sshpass -e reads the password from SSHPASS
            if let Some(password) = self.params.password() {
                cmd.env("SSHPASS", password.expose_secret());
            }
            cmd
        } else {
            Command::new(&self.ssh_program)
        };

        cmd.args(self.ssh_args(remote_command))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }

    fn connection_error(&self, reason: impl Into<String>) -> ClientError {
        ClientError::Connection {
            host: self.params.host().to_string(),
            reason: reason.into(),
        }
    }

    async fn run(&self, remote_command: &str) -> ClientResult<String> {
        let span = tracing::debug_span!(
            crate::tracing::span_names::SSH_EXEC,
            host = %self.params.host(),
            username = %self.params.username(),
        );
        self.run_in_session(remote_command).instrument(span).await
    }

    async fn run_in_session(&self, remote_command: &str) -> ClientResult<String> {
        let budget = self.timeout;
        let mut cmd = self.build_command(remote_command);

        // The child is killed when the future is dropped on timeout
        let output = match tokio::time::timeout(budget, cmd.output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                return Err(self.connection_error(format!("failed to spawn ssh process: {e}")));
            }
            Err(_) => {
                return Err(self.connection_error(format!(
                    "timed out after {:.1}s",
                    budget.as_secs_f64()
                )));
            }
        };

        let stderr = String::from_utf8_lossy(&output.stderr);
        if let Some(err) = classify_ssh_failure(
            self.params.host(),
            self.params.username(),
            output.status.code(),
            &stderr,
            self.use_sshpass,
        ) {
            tracing::debug!(error = %err, "SSH session failed");
            return Err(err);
        }

        if !output.status.success() {
            // The remote command ran; a non-zero status (grep without a
            // match) still yields whatever it printed.
            tracing::debug!(status = %output.status, "Remote command exited non-zero");
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[async_trait]
impl RemoteQuotaClient for SshQuotaClient {
    async fn test_connection(&self) -> ClientResult<()> {
        self.run(NOOP_COMMAND).await.map(|_| ())
    }

    async fn execute_command(&self, command: &str) -> ClientResult<String> {
        self.run(command).await
    }

    fn host(&self) -> &str {
        self.params.host()
    }
}

/// Maps the exit status and stderr of an `ssh`/`sshpass` process to a
/// transport failure.
///
/// Returns `None` when the session itself succeeded, whatever the remote
/// command's own exit status was.
///
/// `sshpass` passes the remote status through, so under `sshpass` a remote
/// command that itself exits 5 or 6 is indistinguishable from a rejected
/// password or unknown host key and is classified as such. Neither
/// [`crate::quota::QUOTA_COMMAND`] nor [`crate::quota::VERSION_COMMAND`] exits
/// with those codes.
#[must_use]
pub fn classify_ssh_failure(
    host: &str,
    username: &str,
    exit_code: Option<i32>,
    stderr: &str,
    via_sshpass: bool,
) -> Option<ClientError> {
    let reason = stderr
        .lines()
        .rev()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .unwrap_or("no diagnostic output")
        .to_string();

    let connection = |reason: String| ClientError::Connection {
        host: host.to_string(),
        reason,
    };
    let authentication = |reason: String| ClientError::Authentication {
        host: host.to_string(),
        username: username.to_string(),
        reason,
    };

    match exit_code {
        None => Some(connection("ssh terminated by signal".to_string())),
        Some(SSHPASS_INVALID_PASSWORD) if via_sshpass => {
            Some(authentication("invalid or incorrect password".to_string()))
        }
        Some(SSHPASS_HOST_KEY_UNKNOWN) if via_sshpass => {
            Some(connection("host public key is unknown".to_string()))
        }
        Some(SSH_ERROR_EXIT) => {
            if AUTH_FAILURE_MARKERS.iter().any(|m| stderr.contains(m)) {
                Some(authentication(reason))
            } else {
                Some(connection(reason))
            }
        }
        Some(_) => None,
    }
}
