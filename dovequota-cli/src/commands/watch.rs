//! Poll quota usage until interrupted.

use std::sync::Arc;

use chrono::Local;
use dovequota_core::quota::SensorReading;
use dovequota_core::{PollEvent, QuotaConfig, QuotaSnapshot, RefreshCoordinator, start_poller};

use crate::cli::Overrides;
use crate::error::CliError;
use crate::format::format_value;
use crate::util::{create_client, create_runtime, load_config, selected_accounts};

/// Watch command handler
///
/// Performs the initial refresh, then prints one block of sensor readings per
/// successful refresh until Ctrl+C.
pub fn cmd_watch(overrides: &Overrides, interval: Option<u32>) -> Result<(), CliError> {
    let mut config = load_config(overrides)?;
    if let Some(secs) = interval {
        config.polling.scan_interval_secs = secs;
    }
    let client = create_client(&config)?;
    let runtime = create_runtime()?;

    runtime.block_on(async {
        let coordinator = Arc::new(RefreshCoordinator::setup(client).await?);
        print_readings(&config, &coordinator.current_snapshot());

        println!(
            "Refreshing every {}s, press Ctrl+C to stop",
            config.polling.effective_interval_secs()
        );

        let (handle, mut events) = start_poller(Arc::clone(&coordinator), &config.polling);

        loop {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    handle.stop().await;
                }
                event = events.recv() => match event {
                    Some(PollEvent::Updated(snapshot)) => print_readings(&config, &snapshot),
                    Some(PollEvent::RefreshFailed(err)) => {
                        eprintln!("[{}] {err}", Local::now().format("%H:%M:%S"));
                    }
                    Some(PollEvent::Unavailable { consecutive_errors }) => {
                        eprintln!(
                            "[{}] Quota data unavailable after {consecutive_errors} failed refreshes",
                            Local::now().format("%H:%M:%S")
                        );
                    }
                    Some(PollEvent::Stopped) | None => break,
                },
            }
        }

        Ok::<(), CliError>(())
    })
}

fn print_readings(config: &QuotaConfig, snapshot: &QuotaSnapshot) {
    let accounts = selected_accounts(config, snapshot, false);
    println!("[{}]", Local::now().format("%Y-%m-%d %H:%M:%S"));
    for reading in snapshot.readings(&accounts) {
        print_reading(&reading);
    }
}

fn print_reading(reading: &SensorReading) {
    if !reading.enabled_by_default {
        return;
    }
    println!(
        "  {:<50} {}",
        reading.entity_id,
        format_value(reading.value, reading.unit)
    );
}
