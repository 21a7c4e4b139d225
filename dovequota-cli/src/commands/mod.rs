//! Command handler modules for the CLI.

mod accounts;
mod completions;
mod show;
mod version;
mod watch;

use crate::cli::{Commands, Overrides};
use crate::error::CliError;

/// Dispatch a CLI command to the appropriate handler.
pub fn dispatch(overrides: &Overrides, command: Commands) -> Result<(), CliError> {
    match command {
        Commands::Test => test::cmd_test(overrides),
        Commands::Accounts { format } => accounts::cmd_accounts(overrides, format),
        Commands::Show { all, format } => show::cmd_show(overrides, all, format),
        Commands::Watch { interval } => watch::cmd_watch(overrides, interval),
        Commands::Version => version::cmd_version(overrides),
        Commands::Completions { shell } => completions::cmd_completions(shell),
    }
}
