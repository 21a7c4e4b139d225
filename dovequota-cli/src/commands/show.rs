//! Show quota usage command.

use chrono::{DateTime, Utc};
use dovequota_core::{QuotaRecord, QuotaSnapshot, RefreshCoordinator};
use serde::Serialize;

use crate::cli::{OutputFormat, Overrides};
use crate::error::CliError;
use crate::format::format_quota_table;
use crate::util::{create_client, create_runtime, load_config, selected_accounts};

/// JSON document printed by `show --format json`
#[derive(Debug, Serialize)]
pub struct ShowOutput<'a> {
    pub host: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refreshed_at: Option<DateTime<Utc>>,
    pub accounts: Vec<&'a QuotaRecord>,
    /// Selected accounts the server did not report
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub missing: Vec<&'a str>,
}

impl<'a> ShowOutput<'a> {
    /// Collects the given accounts from a snapshot
    pub fn new(
        host: &'a str,
        snapshot: &'a QuotaSnapshot,
        accounts: &'a [String],
        refreshed_at: Option<DateTime<Utc>>,
    ) -> Self {
        let (found, missing): (Vec<_>, Vec<_>) = accounts
            .iter()
            .map(|a| (a.as_str(), snapshot.get(a)))
            .partition(|(_, record)| record.is_some());

        Self {
            host,
            version: snapshot.version(),
            refreshed_at,
            accounts: found.into_iter().filter_map(|(_, r)| r).collect(),
            missing: missing.into_iter().map(|(a, _)| a).collect(),
        }
    }
}

/// Show quota command handler
pub fn cmd_show(overrides: &Overrides, all: bool, format: OutputFormat) -> Result<(), CliError> {
    let config = load_config(overrides)?;
    let client = create_client(&config)?;
    let runtime = create_runtime()?;

    let coordinator = runtime.block_on(RefreshCoordinator::setup(client))?;
    let state = coordinator.state();
    let snapshot = state.current_snapshot.as_ref();
    let accounts = selected_accounts(&config, snapshot, all);

    match format {
        OutputFormat::Table => {
            println!("{}", format_quota_table(snapshot, &accounts));
            if let Some(version) = snapshot.version() {
                println!("\nDovecot {version} on {}", config.hostname);
            }
            if snapshot.malformed_lines() > 0 {
                eprintln!(
                    "Warning: {} line(s) of quota output could not be parsed",
                    snapshot.malformed_lines()
                );
            }
        }
        OutputFormat::Json => {
            let output = ShowOutput::new(
                &config.hostname,
                snapshot,
                &accounts,
                state.last_refresh_time,
            );
            let json = serde_json::to_string_pretty(&output)
                .map_err(|e| CliError::Output(format!("Failed to serialize to JSON: {e}")))?;
            println!("{json}");
        }
    }

    Ok(())
}
