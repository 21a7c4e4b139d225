//! CLI argument parsing types using `clap`.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_complete::Shell;

/// Dovecot mailbox quota monitor
#[derive(Parser)]
#[command(name = "dovequota-cli")]
#[command(author, version, about = "Dovecot mailbox quota monitor")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, global = true, env = "DOVEQUOTA_CONFIG")]
    pub config: Option<PathBuf>,

    /// Mail server host (overrides the configuration file)
    #[arg(short = 'H', long, global = true, env = "DOVEQUOTA_HOST")]
    pub host: Option<String>,

    /// SSH login name (overrides the configuration file)
    #[arg(short, long, global = true, env = "DOVEQUOTA_USER")]
    pub user: Option<String>,

    /// SSH port (overrides the configuration file)
    #[arg(short, long, global = true, env = "DOVEQUOTA_PORT")]
    pub port: Option<u16>,

    /// Private key for public-key authentication
    #[arg(short, long, global = true, env = "DOVEQUOTA_IDENTITY_FILE")]
    pub identity_file: Option<String>,

    /// Prompt for the SSH password instead of reading it from the file
    #[arg(long, global = true)]
    pub ask_password: bool,

    /// Increase output verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Append logs to this file instead of stderr
    #[arg(long, global = true, value_name = "PATH", env = "DOVEQUOTA_LOG_FILE")]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Connection overrides taken from flags or `DOVEQUOTA_*` variables
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub config: Option<PathBuf>,
    pub host: Option<String>,
    pub user: Option<String>,
    pub port: Option<u16>,
    pub identity_file: Option<String>,
    pub ask_password: bool,
}

impl Cli {
    /// Splits out the connection overrides
    pub fn overrides(&self) -> Overrides {
        Overrides {
            config: self.config.clone(),
            host: self.host.clone(),
            user: self.user.clone(),
            port: self.port,
            identity_file: self.identity_file.clone(),
            ask_password: self.ask_password,
        }
    }
}

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Test SSH connectivity and credentials
    #[command(about = "Check that the mail server accepts the configured credentials")]
    Test,

    /// List the accounts the server reports quota for
    #[command(about = "Discover accounts on the mail server")]
    Accounts {
        /// Output format
        #[arg(short, long, default_value = "table", value_enum)]
        format: OutputFormat,
    },

    /// Show quota usage
    #[command(about = "Fetch quota usage once and print it")]
    Show {
        /// Show every account, not only the selected ones
        #[arg(short, long)]
        all: bool,

        /// Output format
        #[arg(short, long, default_value = "table", value_enum)]
        format: OutputFormat,
    },

    /// Poll quota usage until interrupted
    #[command(about = "Poll quota usage on the configured interval")]
    Watch {
        /// Seconds between refreshes (overrides the configuration file)
        #[arg(long, value_name = "SECS")]
        interval: Option<u32>,
    },

    /// Print the Dovecot version of the server
    Version,

    /// Generate shell completions
    #[command(about = "Generate shell completions for bash, zsh, fish, etc.")]
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Output format options
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Display as formatted table
    #[default]
    Table,
    /// Output as JSON
    Json,
}
