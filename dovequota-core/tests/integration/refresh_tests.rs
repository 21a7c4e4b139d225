//! Single-flight refresh and failure isolation

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use dovequota_core::{
    ClientError, ClientResult, PollEvent, PollSettings, QUOTA_COMMAND, RefreshCause,
    RefreshCoordinator, RefreshError, RemoteQuotaClient, VERSION_COMMAND, start_poller,
};

/// Answers the quota command from a queue (repeating the last entry) after a
/// configurable delay
struct ScriptedClient {
    quota: Mutex<Vec<ClientResult<String>>>,
    delay: Duration,
    quota_calls: AtomicUsize,
    version_calls: AtomicUsize,
}

impl ScriptedClient {
    fn new(script: Vec<ClientResult<String>>, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            quota: Mutex::new(script),
            delay,
            quota_calls: AtomicUsize::new(0),
            version_calls: AtomicUsize::new(0),
        })
    }

    fn next_quota(&self) -> ClientResult<String> {
        let mut script = self.quota.lock().unwrap();
        if script.len() > 1 {
            script.remove(0)
        } else {
            script[0].clone()
        }
    }
}

#[async_trait]
impl RemoteQuotaClient for ScriptedClient {
    async fn test_connection(&self) -> ClientResult<()> {
        Ok(())
    }

    async fn execute_command(&self, command: &str) -> ClientResult<String> {
        tokio::time::sleep(self.delay).await;
        match command {
            QUOTA_COMMAND => {
                self.quota_calls.fetch_add(1, Ordering::SeqCst);
                self.next_quota()
            }
            VERSION_COMMAND => {
                self.version_calls.fetch_add(1, Ordering::SeqCst);
                Ok("2.3.21 (47349e2482)\n".into())
            }
            other => panic!("unexpected command {other}"),
        }
    }

    fn host(&self) -> &str {
        "mail.example.com"
    }
}

fn unreachable() -> ClientResult<String> {
    Err(ClientError::Connection {
        host: "mail.example.com".into(),
        reason: "Connection timed out".into(),
    })
}

const ALICE_HALF_FULL: &str = "alice@example.com STORAGE STORAGE - 512 1024 50\n";
const ALICE_FULL: &str = "alice@example.com STORAGE STORAGE - 1024 1024 100\n";

#[tokio::test(start_paused = true)]
async fn concurrent_refreshes_share_one_fetch() {
    let client = ScriptedClient::new(vec![Ok(ALICE_HALF_FULL.into())], Duration::from_secs(5));
    let coordinator = RefreshCoordinator::new(client.clone());

    let (first, second) = futures::join!(coordinator.refresh(), coordinator.refresh());
    let first = first.unwrap();
    let second = second.unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(client.quota_calls.load(Ordering::SeqCst), 1);
    assert_eq!(client.version_calls.load(Ordering::SeqCst), 1);
    assert!(Arc::ptr_eq(&first, &coordinator.current_snapshot()));
}

#[tokio::test(start_paused = true)]
async fn sequential_refreshes_fetch_again() {
    let client = ScriptedClient::new(
        vec![Ok(ALICE_HALF_FULL.into()), Ok(ALICE_FULL.into())],
        Duration::from_millis(10),
    );
    let coordinator = RefreshCoordinator::new(client.clone());

    let first = coordinator.refresh().await.unwrap();
    let second = coordinator.refresh().await.unwrap();

    assert!(!Arc::ptr_eq(&first, &second));
    assert_eq!(client.quota_calls.load(Ordering::SeqCst), 2);
    assert_eq!(
        second.get("alice@example.com").unwrap().percentage_used(),
        Some(100.0)
    );
}

#[tokio::test(start_paused = true)]
async fn readers_see_previous_snapshot_while_refreshing() {
    let client = ScriptedClient::new(
        vec![Ok(ALICE_HALF_FULL.into()), Ok(ALICE_FULL.into())],
        Duration::from_secs(10),
    );
    let coordinator = Arc::new(RefreshCoordinator::new(client));
    let initial = coordinator.refresh().await.unwrap();

    let background = {
        let coordinator = Arc::clone(&coordinator);
        tokio::spawn(async move { coordinator.refresh().await })
    };

    tokio::time::sleep(Duration::from_secs(1)).await;
    assert!(coordinator.is_refreshing());
    assert!(Arc::ptr_eq(&initial, &coordinator.current_snapshot()));

    let updated = background.await.unwrap().unwrap();
    assert!(!coordinator.is_refreshing());
    assert!(Arc::ptr_eq(&updated, &coordinator.current_snapshot()));
}

#[tokio::test(start_paused = true)]
async fn coalesced_callers_share_failure() {
    let client = ScriptedClient::new(vec![unreachable()], Duration::from_secs(5));
    let coordinator = RefreshCoordinator::new(client.clone());

    let (first, second) = futures::join!(coordinator.refresh(), coordinator.refresh());
    let first = first.unwrap_err();
    assert_eq!(first, second.unwrap_err());
    assert_eq!(first.client_error().map(ClientError::reason_key), Some("cannot_connect"));
    assert_eq!(client.quota_calls.load(Ordering::SeqCst), 1);
    assert_eq!(client.version_calls.load(Ordering::SeqCst), 0);
    assert!(coordinator.current_snapshot().is_empty());
}

#[tokio::test]
async fn failed_refresh_keeps_last_good_snapshot() {
    let client = ScriptedClient::new(
        vec![
            Ok(ALICE_HALF_FULL.into()),
            unreachable(),
            Ok("garbage\n".into()),
        ],
        Duration::ZERO,
    );
    let coordinator = RefreshCoordinator::setup(client).await.unwrap();
    let good = coordinator.current_snapshot();
    let refreshed_at = coordinator.last_refresh_time();

    let err = coordinator.refresh().await.unwrap_err();
    assert!(matches!(err, RefreshError::Failed(RefreshCause::Client(_))));

    let err = coordinator.refresh().await.unwrap_err();
    assert!(matches!(err, RefreshError::Failed(RefreshCause::Parse(_))));

    let state = coordinator.state();
    assert!(Arc::ptr_eq(&good, &state.current_snapshot));
    assert_eq!(state.last_refresh_time, refreshed_at);
    assert_eq!(state.current_snapshot.version(), Some("2.3.21"));
}

#[tokio::test]
async fn setup_reports_invalid_auth() {
    let client = ScriptedClient::new(
        vec![Err(ClientError::Authentication {
            host: "mail.example.com".into(),
            username: "admin".into(),
            reason: "Permission denied (publickey,password).".into(),
        })],
        Duration::ZERO,
    );

    let err = RefreshCoordinator::setup(client).await.unwrap_err();
    assert!(matches!(err, RefreshError::Setup(_)));
    assert_eq!(
        err.client_error().map(ClientError::reason_key),
        Some("invalid_auth")
    );
}

#[tokio::test(start_paused = true)]
async fn poller_recovers_after_outage() {
    let client = ScriptedClient::new(
        vec![
            Ok(ALICE_HALF_FULL.into()),
            unreachable(),
            Ok(ALICE_FULL.into()),
        ],
        Duration::ZERO,
    );
    let coordinator = Arc::new(RefreshCoordinator::setup(client.clone()).await.unwrap());
    let settings = PollSettings {
        scan_interval_secs: 300,
        max_consecutive_errors: 1,
    };
    let (handle, mut events) = start_poller(Arc::clone(&coordinator), &settings);

    assert!(matches!(events.recv().await, Some(PollEvent::RefreshFailed(_))));
    assert!(matches!(
        events.recv().await,
        Some(PollEvent::Unavailable {
            consecutive_errors: 1
        })
    ));
    match events.recv().await {
        Some(PollEvent::Updated(snapshot)) => {
            assert_eq!(
                snapshot.get("alice@example.com").unwrap().used_kb(),
                1024.0
            );
        }
        other => panic!("expected recovery, got {other:?}"),
    }

    handle.stop().await;
    while let Some(event) = events.recv().await {
        if matches!(event, PollEvent::Stopped) {
            break;
        }
    }
    assert_eq!(client.quota_calls.load(Ordering::SeqCst), 3);
}
