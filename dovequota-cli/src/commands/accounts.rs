//! Account discovery command.

use dovequota_core::RefreshCoordinator;

use crate::cli::{OutputFormat, Overrides};
use crate::error::CliError;
use crate::util::{create_client, create_runtime, load_config};

/// Lists every account the server reports quota for, sorted by id.
/// Accounts selected in the configuration are marked with `*`.
pub fn cmd_accounts(overrides: &Overrides, format: OutputFormat) -> Result<(), CliError> {
    let config = load_config(overrides)?;
    let client = create_client(&config)?;
    let runtime = create_runtime()?;

    let coordinator = runtime.block_on(RefreshCoordinator::setup(client))?;
    let snapshot = coordinator.current_snapshot();
    let accounts: Vec<&str> = snapshot.account_ids().collect();

    match format {
        OutputFormat::Table => {
            if accounts.is_empty() {
                println!("No accounts found.");
                return Ok(());
            }
            for account in &accounts {
                let marker = if config.accounts.iter().any(|a| a == account) {
                    "*"
                } else {
                    " "
                };
                println!("{marker} {account}");
            }
        }
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&accounts)
                .map_err(|e| CliError::Output(format!("Failed to serialize to JSON: {e}")))?;
            println!("{json}");
        }
    }

    for selected in config.accounts.iter().filter(|a| snapshot.get(a).is_none()) {
        tracing::warn!(account = %selected, "Selected account not reported by the server");
    }

    Ok(())
}
