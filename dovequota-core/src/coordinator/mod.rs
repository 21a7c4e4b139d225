//! Refresh coordination
//!
//! [`RefreshCoordinator`] runs the quota and version commands through a
//! [`RemoteQuotaClient`], parses the output and keeps the last good
//! [`QuotaSnapshot`]. At most one refresh runs at a time; callers that arrive
//! while one is in flight wait for it and share its outcome.
//!
//! [`start_poller`] drives the coordinator on a fixed interval.

mod poller;

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tracing::Instrument;

pub use poller::{PollEvent, PollerHandle, start_poller};

use crate::client::RemoteQuotaClient;
use crate::error::{RefreshCause, RefreshError, RefreshResult};
use crate::quota::{QUOTA_COMMAND, QuotaSnapshot, QuotaSnapshotBuilder, VERSION_COMMAND};

/// Point-in-time view of the coordinator
#[derive(Debug, Clone)]
pub struct RefreshState {
    /// Last successfully built snapshot (empty before the first success)
    pub current_snapshot: Arc<QuotaSnapshot>,
    /// When the current snapshot was stored
    pub last_refresh_time: Option<DateTime<Utc>>,
    /// Whether a refresh is running right now
    pub in_flight: bool,
}

/// Snapshot and timestamp, replaced together
#[derive(Debug)]
struct Stored {
    snapshot: Arc<QuotaSnapshot>,
    refreshed_at: Option<DateTime<Utc>>,
}

/// Clears the in-flight flag even if the refresh future is dropped
struct InFlightGuard<'a>(&'a AtomicBool);

impl<'a> InFlightGuard<'a> {
    fn new(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::Release);
        Self(flag)
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Drives quota refreshes and holds the current snapshot
pub struct RefreshCoordinator {
    client: Arc<dyn RemoteQuotaClient>,
    stored: RwLock<Stored>,
    in_flight: AtomicBool,
    /// Bumped after every completed refresh
    generation: AtomicU64,
    /// Held for the duration of a refresh; keeps the latest outcome for
    /// callers that queued behind it
    last_outcome: Mutex<Option<RefreshResult<Arc<QuotaSnapshot>>>>,
}

impl std::fmt::Debug for RefreshCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshCoordinator")
            .field("host", &self.client.host())
            .field("in_flight", &self.is_refreshing())
            .field("generation", &self.generation.load(Ordering::Acquire))
            .finish_non_exhaustive()
    }
}

impl RefreshCoordinator {
    /// Creates a coordinator with an empty snapshot. No remote call is made.
    #[must_use]
    pub fn new(client: Arc<dyn RemoteQuotaClient>) -> Self {
        Self {
            client,
            stored: RwLock::new(Stored {
                snapshot: Arc::new(QuotaSnapshot::empty()),
                refreshed_at: None,
            }),
            in_flight: AtomicBool::new(false),
            generation: AtomicU64::new(0),
            last_outcome: Mutex::new(None),
        }
    }

    /// Creates a coordinator and performs the first refresh.
    ///
    /// # Errors
    ///
    /// Returns [`RefreshError::Setup`] if the first refresh fails; the
    /// coordinator is not usable in that case.
    pub async fn setup(client: Arc<dyn RemoteQuotaClient>) -> RefreshResult<Self> {
        let coordinator = Self::new(client);
        if let Err(err) = coordinator.refresh().await {
            tracing::error!(host = %coordinator.client.host(), error = %err, "Initial quota refresh failed");
            return Err(RefreshError::Setup(err.cause().clone()));
        }
        Ok(coordinator)
    }

    /// Fetches a new snapshot and makes it current.
    ///
    /// If a refresh is already running, waits for it and returns its outcome
    /// instead of starting another.
    ///
    /// # Errors
    ///
    /// Returns [`RefreshError::Failed`] if the remote command or the parser
    /// failed. The current snapshot is left untouched.
    pub async fn refresh(&self) -> RefreshResult<Arc<QuotaSnapshot>> {
        let observed = self.generation.load(Ordering::Acquire);
        let mut last_outcome = self.last_outcome.lock().await;

        if self.generation.load(Ordering::Acquire) != observed
            && let Some(outcome) = last_outcome.as_ref()
        {
            tracing::debug!("Joined in-flight quota refresh");
            return outcome.clone();
        }

        let _in_flight = InFlightGuard::new(&self.in_flight);
        let span = tracing::info_span!(
            crate::tracing::span_names::QUOTA_REFRESH,
            host = %self.client.host()
        );

        let outcome = match self.fetch().instrument(span).await {
            Ok(snapshot) => {
                let snapshot = Arc::new(snapshot);
                self.store(Arc::clone(&snapshot));
                Ok(snapshot)
            }
            Err(cause) => {
                tracing::warn!(error = %cause, "Quota refresh failed, keeping previous snapshot");
                Err(RefreshError::Failed(cause))
            }
        };

        *last_outcome = Some(outcome.clone());
        self.generation.fetch_add(1, Ordering::AcqRel);
        outcome
    }

    async fn fetch(&self) -> Result<QuotaSnapshot, RefreshCause> {
        let output = self.client.execute_command(QUOTA_COMMAND).await?;
        if output.trim().is_empty() {
            tracing::info!("Quota command returned no output");
        }
        let snapshot = QuotaSnapshotBuilder::parse(&output)?;

        // The version is optional metadata
        let version = match self.client.execute_command(VERSION_COMMAND).await {
            Ok(output) => QuotaSnapshotBuilder::parse_version(&output),
            Err(err) => {
                tracing::warn!(error = %err, "Could not determine Dovecot version");
                None
            }
        };

        tracing::info!(
            accounts = snapshot.len(),
            malformed = snapshot.malformed_lines(),
            version = version.as_deref().unwrap_or("unknown"),
            "Quota refresh complete"
        );

        Ok(snapshot.with_version(version))
    }

    fn store(&self, snapshot: Arc<QuotaSnapshot>) {
        let mut stored = self.stored.write().unwrap_or_else(PoisonError::into_inner);
        *stored = Stored {
            snapshot,
            refreshed_at: Some(Utc::now()),
        };
    }

    /// The last successfully stored snapshot (empty if none succeeded yet).
    /// Never waits for a running refresh.
    #[must_use]
    pub fn current_snapshot(&self) -> Arc<QuotaSnapshot> {
        let stored = self.stored.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&stored.snapshot)
    }

    /// When the current snapshot was stored
    #[must_use]
    pub fn last_refresh_time(&self) -> Option<DateTime<Utc>> {
        self.stored
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .refreshed_at
    }

    /// Whether a refresh is running
    #[must_use]
    pub fn is_refreshing(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Snapshot, timestamp and in-flight flag in one view
    #[must_use]
    pub fn state(&self) -> RefreshState {
        let stored = self.stored.read().unwrap_or_else(PoisonError::into_inner);
        RefreshState {
            current_snapshot: Arc::clone(&stored.snapshot),
            last_refresh_time: stored.refreshed_at,
            in_flight: self.is_refreshing(),
        }
    }
}
