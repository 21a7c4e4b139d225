//! Parser for `doveadm quota get` output
//!
//! Each line of [`QUOTA_COMMAND`] output describes one mailbox:
//!
//! ```text
//! alice@example.com  User quota  STORAGE  102400  204800  50
//! ```
//!
//! i.e. seven whitespace-separated columns, of which the parser uses the
//! account, `Value`, `Limit` and `%` columns.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;

use super::record::{QuotaRecord, QuotaSnapshot};
use crate::error::{ParseError, ParseResult};

/// Command listing storage quota usage for every user on the server
pub const QUOTA_COMMAND: &str = "doveadm quota get -A | grep STORAGE";

/// Command printing the installed Dovecot version
pub const VERSION_COMMAND: &str = "dovecot --version";

/// Limit column value meaning "no quota configured"
pub const UNBOUNDED_SENTINEL: &str = "-";

/// Number of columns in a quota line
const FIELD_COUNT: usize = 7;

/// Dotted version with at least three components, e.g. `2.3.19.1`
static VERSION_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\d+(?:\.\d+){2,}").expect("VERSION_REGEX is a valid regex pattern")
});

/// Stateless parser turning command output into a [`QuotaSnapshot`]
pub struct QuotaSnapshotBuilder;

impl QuotaSnapshotBuilder {
    /// Parses the full output of [`QUOTA_COMMAND`].
    ///
    /// Malformed lines are logged and skipped; the number skipped is kept on
    /// the snapshot. Later lines for the same account replace earlier ones.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::MalformedRecord`] for the first bad line when the
    /// output contained records but not a single one could be parsed.
    pub fn parse(output: &str) -> ParseResult<QuotaSnapshot> {
        let mut accounts = BTreeMap::new();
        let mut first_error = None;
        let mut malformed = 0usize;

        for line in output.lines().filter(|l| !l.trim().is_empty()) {
            match Self::parse_line(line) {
                Ok(record) => {
                    accounts.insert(record.account_id().to_string(), record);
                }
                Err(err) => {
                    tracing::warn!(error = %err, "Skipping malformed quota line");
                    malformed += 1;
                    first_error.get_or_insert(err);
                }
            }
        }

        if accounts.is_empty()
            && let Some(err) = first_error
        {
            return Err(err);
        }

        tracing::debug!(
            accounts = accounts.len(),
            malformed,
            "Parsed quota output"
        );

        Ok(QuotaSnapshot::new(accounts, malformed))
    }

    /// Parses a single quota line.
    ///
    /// Format: `account <ignored> <ignored> <ignored> used quota percentage`
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::MalformedRecord`] if the line does not have
    /// exactly seven fields or a numeric column does not parse.
    pub fn parse_line(line: &str) -> ParseResult<QuotaRecord> {
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() != FIELD_COUNT {
            return Err(ParseError::malformed(
                line,
                format!("expected {FIELD_COUNT} fields, found {}", parts.len()),
            ));
        }

        let account = parts[0];
        let used = Self::parse_number(line, "used", parts[4])?;
        if used < 0.0 {
            return Err(ParseError::malformed(line, "used value is negative"));
        }

        if parts[5] == UNBOUNDED_SENTINEL {
            return Ok(QuotaRecord::unbounded(account, used));
        }

        let quota = Self::parse_number(line, "quota", parts[5])?;
        let percentage_used = Self::parse_number(line, "percentage", parts[6])?;

        Ok(QuotaRecord::bounded(account, used, quota, percentage_used))
    }

    /// Extracts the first dotted version token from `dovecot --version`
    /// output, e.g. `2.3.19.1` from `2.3.19.1 (9b53102964)`.
    #[must_use]
    pub fn parse_version(output: &str) -> Option<String> {
        VERSION_REGEX
            .find(output)
            .map(|m| m.as_str().to_string())
    }

    fn parse_number(line: &str, column: &str, value: &str) -> ParseResult<f64> {
        value
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| {
                ParseError::malformed(line, format!("{column} column '{value}' is not numeric"))
            })
    }
}
