//! Text formatting for quota output.

use std::fmt::Write as _;

use dovequota_core::QuotaSnapshot;
use dovequota_core::quota::{MetricUnit, QuotaMetric};

/// Formats a metric value with its unit; `-` when undefined
#[must_use]
pub fn format_value(value: Option<f64>, unit: MetricUnit) -> String {
    match (value, unit) {
        (None, _) => "-".to_string(),
        (Some(v), MetricUnit::Kilobytes) => format!("{v:.0} {}", unit.symbol()),
        (Some(v), MetricUnit::Percent) => format!("{v:.1}{}", unit.symbol()),
    }
}

/// Formats the given accounts of a snapshot as a table.
///
/// Accounts missing from the snapshot are listed as unavailable.
#[must_use]
pub fn format_quota_table(snapshot: &QuotaSnapshot, accounts: &[String]) -> String {
    if accounts.is_empty() {
        return "No accounts found.".to_string();
    }

    let rows: Vec<(&str, Vec<String>)> = accounts
        .iter()
        .map(|account| {
            let cells = match snapshot.get(account) {
                Some(record) => QuotaMetric::ALL
                    .iter()
                    .map(|&m| format_value(record.metric(m), m.unit()))
                    .collect(),
                None => {
                    let mut cells = vec!["unavailable".to_string()];
                    cells.resize(QuotaMetric::ALL.len(), String::new());
                    cells
                }
            };
            (account.as_str(), cells)
        })
        .collect();

    let name_width = rows
        .iter()
        .map(|(name, _)| name.len())
        .max()
        .unwrap_or(7)
        .max(7);
    let headers = ["QUOTA", "USED", "USED %", "FREE", "FREE %"];
    let widths: Vec<usize> = headers
        .iter()
        .enumerate()
        .map(|(i, h)| {
            rows.iter()
                .map(|(_, cells)| cells[i].len())
                .max()
                .unwrap_or(0)
                .max(h.len())
        })
        .collect();

    let mut output = String::new();

    let _ = write!(output, "{:<name_width$}", "ACCOUNT");
    for (header, width) in headers.iter().zip(&widths) {
        let _ = write!(output, "  {header:>width$}");
    }
    output.push('\n');

    let _ = write!(output, "{:-<name_width$}", "");
    for width in &widths {
        let _ = write!(output, "  {:->width$}", "");
    }
    output.push('\n');

    for (name, cells) in &rows {
        let _ = write!(output, "{name:<name_width$}");
        for (cell, width) in cells.iter().zip(&widths) {
            let _ = write!(output, "  {cell:>width$}");
        }
        output.push('\n');
    }

    output.trim_end().to_string()
}
