//! Quota data model and `doveadm` output parsing
//!
//! This module is transport-free: it turns command output into immutable
//! [`QuotaSnapshot`]s and describes the per-account metrics consumers read.

pub mod metrics;
mod parser;
mod record;

pub use metrics::{DeviceInfo, MetricUnit, QuotaMetric, SensorReading, entity_id};
pub use parser::{QUOTA_COMMAND, QuotaSnapshotBuilder, UNBOUNDED_SENTINEL, VERSION_COMMAND};
pub use record::{QuotaLimit, QuotaRecord, QuotaSnapshot};
