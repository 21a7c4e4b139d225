//! Periodic refresh loop
//!
//! The poller calls [`RefreshCoordinator::refresh`] on a fixed interval and
//! reports outcomes as [`PollEvent`]s. It counts consecutive failures and
//! reports the data unavailable once the configured threshold is reached, but
//! keeps polling so a later success recovers.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior};

use super::RefreshCoordinator;
use crate::config::PollSettings;
use crate::error::RefreshError;
use crate::quota::QuotaSnapshot;

/// Events emitted by the poller
#[derive(Debug, Clone)]
pub enum PollEvent {
    /// A refresh succeeded
    Updated(Arc<QuotaSnapshot>),
    /// A refresh failed; the previous snapshot stays current
    RefreshFailed(RefreshError),
    /// The failure threshold was reached; consumers should mark the data
    /// unavailable until the next `Updated`
    Unavailable {
        /// Consecutive failures so far
        consecutive_errors: u32,
    },
    /// The poller stopped
    Stopped,
}

/// Handle to control a running poller
#[derive(Debug)]
pub struct PollerHandle {
    stop_tx: mpsc::Sender<()>,
}

impl PollerHandle {
    /// Signals the poller to stop
    pub async fn stop(&self) {
        let _ = self.stop_tx.send(()).await;
    }
}

/// Starts the refresh loop.
///
/// The first refresh happens one interval after the call; the owner is
/// expected to have performed the initial refresh through
/// [`RefreshCoordinator::setup`].
///
/// Returns a handle to stop the loop and a receiver for events. The loop also
/// ends when the receiver is dropped.
pub fn start_poller(
    coordinator: Arc<RefreshCoordinator>,
    settings: &PollSettings,
) -> (PollerHandle, mpsc::Receiver<PollEvent>) {
    let (stop_tx, mut stop_rx) = mpsc::channel::<()>(1);
    let (event_tx, event_rx) = mpsc::channel::<PollEvent>(8);

    let interval = Duration::from_secs(u64::from(settings.effective_interval_secs()));
    let max_errors = settings.effective_max_errors();

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut consecutive_errors: u32 = 0;

        loop {
            tokio::select! {
                _ = stop_rx.recv() => {
                    let _ = event_tx.send(PollEvent::Stopped).await;
                    break;
                }
                _ = ticker.tick() => {
                    let event = match coordinator.refresh().await {
                        Ok(snapshot) => {
                            if consecutive_errors >= max_errors {
                                tracing::info!("Quota data available again");
                            }
                            consecutive_errors = 0;
                            PollEvent::Updated(snapshot)
                        }
                        Err(err) => {
                            consecutive_errors = consecutive_errors.saturating_add(1);
                            tracing::debug!(
                                error = %err,
                                attempt = consecutive_errors,
                                "Scheduled quota refresh failed"
                            );
                            PollEvent::RefreshFailed(err)
                        }
                    };

                    if event_tx.send(event).await.is_err() {
                        break; // receiver dropped
                    }

                    if consecutive_errors == max_errors {
                        tracing::warn!(
                            errors = consecutive_errors,
                            "Quota data unavailable after {max_errors} consecutive failures"
                        );
                        if event_tx
                            .send(PollEvent::Unavailable { consecutive_errors })
                            .await
                            .is_err()
                        {
                            break;
                        }
                    }
                }
            }
        }
    });

    (PollerHandle { stop_tx }, event_rx)
}
