//! Typed quota records and immutable snapshots

use std::collections::BTreeMap;

use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};

/// Storage limit for a mailbox
///
/// `doveadm` prints `-` as the limit when no quota is configured; that maps to
/// [`QuotaLimit::Unbounded`]. Ratios only exist for bounded limits, so the
/// percentage lives inside the bounded variant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum QuotaLimit {
    /// A configured limit
    Bounded {
        /// Limit in kilobytes
        quota_kb: f64,
        /// Percentage of the limit in use, as reported by the server
        percentage_used: f64,
    },
    /// No limit configured
    Unbounded,
}

impl QuotaLimit {
    /// Returns true for [`QuotaLimit::Unbounded`]
    #[must_use]
    pub const fn is_unbounded(&self) -> bool {
        matches!(self, Self::Unbounded)
    }
}

/// Quota usage of a single mailbox account
#[derive(Debug, Clone, PartialEq)]
pub struct QuotaRecord {
    account_id: String,
    used_kb: f64,
    limit: QuotaLimit,
}

impl QuotaRecord {
    /// Creates a record for a mailbox with a configured limit.
    /// `used_kb` must not be negative.
    #[must_use]
    pub fn bounded(
        account_id: impl Into<String>,
        used_kb: f64,
        quota_kb: f64,
        percentage_used: f64,
    ) -> Self {
        debug_assert!(used_kb >= 0.0, "used_kb must not be negative");
        Self {
            account_id: account_id.into(),
            used_kb,
            limit: QuotaLimit::Bounded {
                quota_kb,
                percentage_used,
            },
        }
    }

    /// Creates a record for a mailbox without a limit.
    /// `used_kb` must not be negative.
    #[must_use]
    pub fn unbounded(account_id: impl Into<String>, used_kb: f64) -> Self {
        debug_assert!(used_kb >= 0.0, "used_kb must not be negative");
        Self {
            account_id: account_id.into(),
            used_kb,
            limit: QuotaLimit::Unbounded,
        }
    }

    /// Account identifier exactly as printed by the server
    #[must_use]
    pub fn account_id(&self) -> &str {
        &self.account_id
    }

    /// Storage in use, in kilobytes
    #[must_use]
    pub const fn used_kb(&self) -> f64 {
        self.used_kb
    }

    /// The configured limit
    #[must_use]
    pub const fn limit(&self) -> QuotaLimit {
        self.limit
    }

    /// Limit in kilobytes, `None` when unbounded
    #[must_use]
    pub const fn quota_kb(&self) -> Option<f64> {
        match self.limit {
            QuotaLimit::Bounded { quota_kb, .. } => Some(quota_kb),
            QuotaLimit::Unbounded => None,
        }
    }

    /// Percentage of the limit in use, `None` when unbounded
    #[must_use]
    pub const fn percentage_used(&self) -> Option<f64> {
        match self.limit {
            QuotaLimit::Bounded {
                percentage_used, ..
            } => Some(percentage_used),
            QuotaLimit::Unbounded => None,
        }
    }

    /// Remaining storage (`quota - used`), `None` when unbounded
    #[must_use]
    pub fn free_kb(&self) -> Option<f64> {
        self.quota_kb().map(|quota| quota - self.used_kb)
    }

    /// Remaining percentage (`100 - percentage_used`), `None` when unbounded
    #[must_use]
    pub fn percentage_free(&self) -> Option<f64> {
        self.percentage_used().map(|used| 100.0 - used)
    }
}

impl Serialize for QuotaRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("QuotaRecord", 6)?;
        state.serialize_field("name", &self.account_id)?;
        state.serialize_field("used", &self.used_kb)?;
        state.serialize_field("quota", &self.quota_kb())?;
        state.serialize_field("percentage_used", &self.percentage_used())?;
        state.serialize_field("free", &self.free_kb())?;
        state.serialize_field("percentage_free", &self.percentage_free())?;
        state.end()
    }
}

/// Point-in-time quota usage of every account on the server
///
/// Snapshots are never mutated after construction. A refresh builds a new one
/// and swaps it in whole, so holders of an older snapshot are unaffected.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct QuotaSnapshot {
    accounts: BTreeMap<String, QuotaRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    version: Option<String>,
    #[serde(skip_serializing_if = "is_zero")]
    malformed_lines: usize,
}

#[allow(clippy::trivially_copy_pass_by_ref)]
const fn is_zero(n: &usize) -> bool {
    *n == 0
}

impl QuotaSnapshot {
    /// Creates an empty snapshot
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Creates a snapshot from parsed records
    #[must_use]
    pub fn new(accounts: BTreeMap<String, QuotaRecord>, malformed_lines: usize) -> Self {
        Self {
            accounts,
            version: None,
            malformed_lines,
        }
    }

    /// Returns a copy of this snapshot carrying the given server version
    #[must_use]
    pub fn with_version(mut self, version: Option<String>) -> Self {
        self.version = version;
        self
    }

    /// Looks up one account
    #[must_use]
    pub fn get(&self, account_id: &str) -> Option<&QuotaRecord> {
        self.accounts.get(account_id)
    }

    /// All records keyed by account id, in sorted order
    #[must_use]
    pub const fn accounts(&self) -> &BTreeMap<String, QuotaRecord> {
        &self.accounts
    }

    /// Sorted account ids
    pub fn account_ids(&self) -> impl Iterator<Item = &str> {
        self.accounts.keys().map(String::as_str)
    }

    /// Dovecot version reported by the server, if it could be determined
    #[must_use]
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    /// Number of output lines that were skipped as malformed
    #[must_use]
    pub const fn malformed_lines(&self) -> usize {
        self.malformed_lines
    }

    /// Number of accounts
    #[must_use]
    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    /// Returns true if no accounts were reported
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}
