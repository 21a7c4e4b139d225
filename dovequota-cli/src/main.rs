//! `dovequota-cli` - Command-line interface for Dovecot quota monitoring
//!
//! Tests the SSH connection to a mail server, discovers accounts, prints
//! quota usage once or on an interval, and reports the Dovecot version.

mod cli;
mod commands;
mod error;
mod format;
mod util;

use std::path::PathBuf;

use clap::Parser;
use cli::Cli;
use dovequota_core::{TracingConfig, TracingLevel, TracingOutput, init_tracing};
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet, cli.log_file.clone());

    let overrides = cli.overrides();
    let result = commands::dispatch(&overrides, cli.command);

    if let Err(e) = result {
        if !cli.quiet {
            eprintln!("Error: {e}");
        }
        std::process::exit(e.exit_code());
    }
}

/// Logs go to stderr unless `--log-file` is given; `RUST_LOG` replaces the
/// verbosity-derived filter
fn init_logging(verbose: u8, quiet: bool, log_file: Option<PathBuf>) {
    let level = if quiet {
        TracingLevel::Error
    } else {
        TracingLevel::from_verbosity(verbose)
    };
    let output = log_file.map_or(TracingOutput::Stderr, |path| TracingOutput::File { path });
    let mut config = TracingConfig::new().with_level(level).with_output(output);

    if let Ok(filter) = std::env::var(EnvFilter::DEFAULT_ENV)
        && !filter.trim().is_empty()
    {
        config = config.with_filter(filter);
    }

    if let Err(e) = init_tracing(&config) {
        eprintln!("Failed to initialize logging: {e}");
    }
}
