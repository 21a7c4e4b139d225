//! `SshQuotaClient` against a stand-in `ssh` executable
//!
//! The stand-in is a shell script that answers according to the remote
//! command (its last argument), so the real process plumbing runs: spawning,
//! stdout capture, exit status handling and the session timeout.

use std::os::unix::fs::PermissionsExt;
use std::path::PathBuf;
use std::sync::LazyLock;
use std::time::Duration;

use dovequota_core::{
    ClientError, ConnectionParameters, QUOTA_COMMAND, QuotaSnapshotBuilder, RemoteQuotaClient,
    SshQuotaClient,
};
use tempfile::TempDir;

const QUOTA_LINE: &str = "alice@example.com User quota STORAGE 102400 204800 50";

const FAKE_SSH: &str = r#"#!/bin/sh
prev=
last=
for arg; do
    prev=$last
    last=$arg
done
case "$last" in
    "doveadm quota get -A | grep STORAGE")
        echo "alice@example.com User quota STORAGE 102400 204800 50"
        ;;
    true) exit 0 ;;
    destination) echo "$prev" ;;
    nomatch) exit 1 ;;
    denied)
        echo "admin@mail.example.com: Permission denied (publickey,password)." >&2
        exit 255
        ;;
    unreachable)
        echo "ssh: connect to host mail.example.com port 22: Connection refused" >&2
        exit 255
        ;;
    slow) sleep 5 ;;
    *)
        echo "unexpected command: $last" >&2
        exit 2
        ;;
esac
"#;

/// Written once per test binary and never modified afterwards
static SSH_SCRIPT: LazyLock<(TempDir, PathBuf)> = LazyLock::new(|| {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ssh");
    std::fs::write(&path, FAKE_SSH).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    (dir, path)
});

fn client() -> SshQuotaClient {
    SshQuotaClient::new(ConnectionParameters::without_password(
        "mail.example.com",
        "admin",
    ))
    .with_ssh_program(SSH_SCRIPT.1.clone())
}

#[tokio::test]
async fn quota_command_output_is_captured() {
    let output = client().execute_command(QUOTA_COMMAND).await.unwrap();
    assert_eq!(output, format!("{QUOTA_LINE}\n"));

    let snapshot = QuotaSnapshotBuilder::parse(&output).unwrap();
    assert_eq!(
        snapshot.get("alice@example.com").unwrap().free_kb(),
        Some(102_400.0)
    );
}

#[tokio::test]
async fn destination_is_passed_before_command() {
    let output = client().execute_command("destination").await.unwrap();
    assert_eq!(output.trim(), "admin@mail.example.com");
}

#[tokio::test]
async fn non_zero_remote_status_yields_empty_output() {
    let output = client().execute_command("nomatch").await.unwrap();
    assert!(output.is_empty());
}

#[tokio::test]
async fn test_connection_succeeds() {
    client().test_connection().await.unwrap();
}

#[tokio::test]
async fn rejected_credentials_are_authentication_errors() {
    let err = client().execute_command("denied").await.unwrap_err();
    match err {
        ClientError::Authentication {
            ref host,
            ref username,
            ref reason,
        } => {
            assert_eq!(host, "mail.example.com");
            assert_eq!(username, "admin");
            assert!(reason.contains("Permission denied"));
        }
        ClientError::Connection { .. } => panic!("expected auth failure, got {err:?}"),
    }
    assert_eq!(err.reason_key(), "invalid_auth");
}

#[tokio::test]
async fn refused_connection_is_connection_error() {
    let err = client().execute_command("unreachable").await.unwrap_err();
    assert_eq!(err.reason_key(), "cannot_connect");
    assert!(err.to_string().contains("Connection refused"));
}

#[tokio::test]
async fn missing_ssh_binary_is_connection_error() {
    let client = SshQuotaClient::new(ConnectionParameters::without_password("mail", "admin"))
        .with_ssh_program("/nonexistent/dovequota/ssh");

    let err = client.test_connection().await.unwrap_err();
    assert!(matches!(
        err,
        ClientError::Connection { ref reason, .. } if reason.contains("failed to spawn")
    ));
}

#[tokio::test]
async fn session_exceeding_budget_times_out() {
    let client = client().with_timeout(Duration::from_millis(200));

    let started = std::time::Instant::now();
    let err = client.execute_command("slow").await.unwrap_err();

    assert!(started.elapsed() < Duration::from_secs(4));
    assert!(matches!(
        err,
        ClientError::Connection { ref reason, .. } if reason.contains("timed out")
    ));
}
