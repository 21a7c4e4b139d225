//! Dovequota Core Library
//!
//! Retrieves mailbox quota usage from a Dovecot server over SSH, parses the
//! `doveadm quota get` output into typed records and keeps an always-readable
//! snapshot of the latest successful result.
//!
//! # Crate Structure
//!
//! - [`client`] - Remote command execution (`ssh`/`sshpass`)
//! - [`quota`] - Quota records, snapshots, output parsing and named metrics
//! - [`coordinator`] - Single-flight refresh and the periodic poller
//! - [`config`] - `config.toml` loading and validation
//! - [`error`] - Error types for every stage
//! - [`tracing`] - Logging setup and span names

#![warn(missing_docs)]

pub mod client;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod quota;
pub mod tracing;

pub use client::{ConnectionParameters, RemoteQuotaClient, SshQuotaClient};
pub use config::{ConfigManager, PollSettings, QuotaConfig};
pub use coordinator::{PollEvent, PollerHandle, RefreshCoordinator, RefreshState, start_poller};
pub use error::{
    ClientError, ClientResult, ConfigError, ConfigResult, ParseError, ParseResult,
    QuotaMonitorError, RefreshCause, RefreshError, RefreshResult,
};
pub use quota::{
    QUOTA_COMMAND, QuotaLimit, QuotaMetric, QuotaRecord, QuotaSnapshot, QuotaSnapshotBuilder,
    SensorReading, VERSION_COMMAND,
};
pub use crate::tracing::{TracingConfig, TracingLevel, TracingOutput, init_tracing};
