//! Server version command.

use dovequota_core::{QuotaSnapshotBuilder, VERSION_COMMAND};

use crate::cli::Overrides;
use crate::error::CliError;
use crate::util::{create_client, create_runtime, load_config};

/// Prints the Dovecot version reported by `dovecot --version`
pub fn cmd_version(overrides: &Overrides) -> Result<(), CliError> {
    let config = load_config(overrides)?;
    let client = create_client(&config)?;
    let runtime = create_runtime()?;

    let output = runtime.block_on(client.execute_command(VERSION_COMMAND))?;
    let version = QuotaSnapshotBuilder::parse_version(&output).ok_or_else(|| {
        CliError::Quota(format!(
            "Could not determine the Dovecot version from '{}'",
            output.trim()
        ))
    })?;

    println!("{version}");
    Ok(())
}
