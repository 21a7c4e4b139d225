//! Named per-account metrics for polling consumers
//!
//! A home-automation consumer exposes one sensor per (account, metric) pair.
//! This module describes those sensors and turns a [`QuotaSnapshot`] into
//! readings for the accounts the user selected.

use serde::Serialize;

use super::record::{QuotaRecord, QuotaSnapshot};

/// Device model shown for every account
pub const DEVICE_MODEL: &str = "Quota";

/// Device manufacturer shown for every account
pub const DEVICE_MANUFACTURER: &str = "Dovecot";

/// Unit of a metric value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MetricUnit {
    /// Kilobytes
    #[serde(rename = "kB")]
    Kilobytes,
    /// Percent
    #[serde(rename = "%")]
    Percent,
}

impl MetricUnit {
    /// Unit symbol
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Kilobytes => "kB",
            Self::Percent => "%",
        }
    }
}

/// Metrics exposed for each account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QuotaMetric {
    /// Configured limit
    Quota,
    /// Storage in use
    Used,
    /// Percentage of the limit in use
    PercentageUsed,
    /// Remaining storage
    Free,
    /// Remaining percentage
    PercentageFree,
}

impl QuotaMetric {
    /// Every metric, in display order
    pub const ALL: [Self; 5] = [
        Self::Quota,
        Self::Used,
        Self::PercentageUsed,
        Self::Free,
        Self::PercentageFree,
    ];

    /// Stable key used in entity ids and JSON output
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Quota => "quota",
            Self::Used => "used",
            Self::PercentageUsed => "percentage_used",
            Self::Free => "free",
            Self::PercentageFree => "percentage_free",
        }
    }

    /// Unit of the metric value
    #[must_use]
    pub const fn unit(self) -> MetricUnit {
        match self {
            Self::Quota | Self::Used | Self::Free => MetricUnit::Kilobytes,
            Self::PercentageUsed | Self::PercentageFree => MetricUnit::Percent,
        }
    }

    /// Whether consumers should enable this sensor without user action
    #[must_use]
    pub const fn enabled_by_default(self) -> bool {
        !matches!(self, Self::Free | Self::PercentageFree)
    }
}

impl std::str::FromStr for QuotaMetric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|m| m.key() == s)
            .ok_or_else(|| format!("unknown metric '{s}'"))
    }
}

impl std::fmt::Display for QuotaMetric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

impl QuotaRecord {
    /// Value of a named metric, `None` when undefined for an unbounded quota
    #[must_use]
    pub fn metric(&self, metric: QuotaMetric) -> Option<f64> {
        match metric {
            QuotaMetric::Quota => self.quota_kb(),
            QuotaMetric::Used => Some(self.used_kb()),
            QuotaMetric::PercentageUsed => self.percentage_used(),
            QuotaMetric::Free => self.free_kb(),
            QuotaMetric::PercentageFree => self.percentage_free(),
        }
    }
}

/// Device grouping the sensors of one account
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceInfo {
    /// Account id, used as the device name and identifier
    pub name: String,
    /// Always [`DEVICE_MODEL`]
    pub model: &'static str,
    /// Always [`DEVICE_MANUFACTURER`]
    pub manufacturer: &'static str,
    /// Dovecot version running on the server
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sw_version: Option<String>,
}

impl DeviceInfo {
    /// Creates device info for an account
    #[must_use]
    pub fn for_account(account: &str, sw_version: Option<&str>) -> Self {
        Self {
            name: account.to_string(),
            model: DEVICE_MODEL,
            manufacturer: DEVICE_MANUFACTURER,
            sw_version: sw_version.map(str::to_string),
        }
    }
}

/// A single sensor value
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensorReading {
    /// Entity id, `sensor.<account> <metric>` lowercased
    pub entity_id: String,
    /// Account the reading belongs to
    pub account: String,
    /// Which metric
    pub metric: QuotaMetric,
    /// Value, `None` when the account is unknown or the metric undefined
    pub value: Option<f64>,
    /// Unit symbol
    pub unit: MetricUnit,
    /// Whether the sensor is enabled by default
    pub enabled_by_default: bool,
}

/// Builds the entity id for an account metric
#[must_use]
pub fn entity_id(account: &str, metric: QuotaMetric) -> String {
    format!("sensor.{account} {}", metric.key()).to_lowercase()
}

impl QuotaSnapshot {
    /// Sensor readings for the selected accounts, in selection order.
    ///
    /// Accounts missing from the snapshot still produce readings, with every
    /// value `None`, so a consumer can mark them unavailable.
    #[must_use]
    pub fn readings<S: AsRef<str>>(&self, selected: &[S]) -> Vec<SensorReading> {
        selected
            .iter()
            .map(AsRef::as_ref)
            .flat_map(|account| {
                let record = self.get(account);
                QuotaMetric::ALL.into_iter().map(move |metric| SensorReading {
                    entity_id: entity_id(account, metric),
                    account: account.to_string(),
                    metric,
                    value: record.and_then(|r| r.metric(metric)),
                    unit: metric.unit(),
                    enabled_by_default: metric.enabled_by_default(),
                })
            })
            .collect()
    }

    /// Device info for an account, carrying the server version
    #[must_use]
    pub fn device_info(&self, account: &str) -> DeviceInfo {
        DeviceInfo::for_account(account, self.version())
    }
}
