//! Output formatting module for clawstat
//!
//! This module provides formatters for displaying usage data in different formats:
//! - Table format for human-readable terminal output
//! - JSON format for the status dashboard and other tools
//!
//! # Examples
//!
//! ```no_run
//! use clawstat::output::get_formatter;
//! use clawstat::aggregation::UsageReport;
//!
//! let report = UsageReport::default();
//!
//! // Table for a terminal
//! let formatter = get_formatter(false);
//! println!("{}", formatter.format_report(&report).unwrap());
//!
//! // JSON with the `total` / `byModel` / `estimatedCost` field names
//! let json_formatter = get_formatter(true);
//! println!("{}", json_formatter.format_report(&report).unwrap());
//! ```

use crate::aggregation::{SessionUsage, Totals, UsageReport};
use crate::diagnostics::ScanWarning;
use crate::error::{ClawstatError, Result};
use prettytable::{Cell, Row, Table, format, row};
use serde::Serialize;
use serde_json::json;

/// Trait for output formatters
pub trait OutputFormatter {
    /// Format the workspace usage report
    fn format_report(&self, report: &UsageReport) -> Result<String>;

    /// Format the per-session breakdown
    fn format_sessions(&self, data: &[SessionUsage], totals: &Totals) -> Result<String>;

    /// Format the sessions skipped during a scan
    fn format_warnings(&self, warnings: &[ScanWarning]) -> Result<String>;
}

/// Table formatter for human-readable output
///
/// Numbers are formatted with thousands separators and costs are shown
/// with dollar signs.
pub struct TableFormatter;

impl TableFormatter {
    /// Format a number with thousands separators
    fn format_number(n: u64) -> String {
        let s = n.to_string();
        let mut result = String::new();

        for (count, ch) in s.chars().rev().enumerate() {
            if count > 0 && count % 3 == 0 {
                result.push(',');
            }
            result.push(ch);
        }

        result.chars().rev().collect()
    }

    /// Format currency with dollar sign
    ///
    /// Per-token rates are tiny, so four decimals are kept.
    fn format_currency(amount: f64) -> String {
        format!("${amount:.4}")
    }

    fn format_share(part: u64, total: u64) -> String {
        if total == 0 {
            "-".to_string()
        } else {
            format!("{:.1}%", part as f64 * 100.0 / total as f64)
        }
    }
}

impl OutputFormatter for TableFormatter {
    fn format_report(&self, report: &UsageReport) -> Result<String> {
        let mut table = Table::new();
        table.set_format(*format::consts::FORMAT_NO_LINESEP_WITH_TITLE);

        table.set_titles(row![b -> "Model", b -> "Tokens", b -> "Share"]);

        for (model, tokens) in &report.by_model {
            table.add_row(row![
                model.as_str(),
                r -> Self::format_number(*tokens),
                r -> Self::format_share(*tokens, report.total)
            ]);
        }

        table.add_row(Row::new(vec![Cell::new(""); 3]));
        table.add_row(row![
            b -> "TOTAL",
            b -> Self::format_number(report.total),
            ""
        ]);

        Ok(format!(
            "{}\nEstimated cost: {}\n",
            table,
            Self::format_currency(report.estimated_cost)
        ))
    }

    fn format_sessions(&self, data: &[SessionUsage], totals: &Totals) -> Result<String> {
        let mut table = Table::new();
        table.set_format(*format::consts::FORMAT_NO_LINESEP_WITH_TITLE);

        table.set_titles(row![
            b -> "Session",
            b -> "Kind",
            b -> "Messages",
            b -> "Prompt",
            b -> "Completion",
            b -> "Total Tokens",
            b -> "Cost",
            b -> "Models",
            b -> "Last Activity"
        ]);

        for session in data {
            let models = session
                .by_model
                .keys()
                .map(|m| m.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            let last_activity = session
                .last_activity
                .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_else(|| "-".to_string());

            table.add_row(row![
                session.label,
                session.kind,
                r -> session.messages,
                r -> Self::format_number(session.tokens.prompt_tokens),
                r -> Self::format_number(session.tokens.completion_tokens),
                r -> Self::format_number(session.tokens.total()),
                r -> Self::format_currency(session.estimated_cost),
                models,
                last_activity
            ]);
        }

        // Add separator
        table.add_row(Row::new(vec![Cell::new(""); 9]));

        table.add_row(row![
            b -> "TOTAL",
            "",
            "",
            b -> Self::format_number(totals.tokens.prompt_tokens),
            b -> Self::format_number(totals.tokens.completion_tokens),
            b -> Self::format_number(totals.tokens.total()),
            b -> Self::format_currency(totals.estimated_cost),
            "",
            ""
        ]);

        Ok(table.to_string())
    }

    fn format_warnings(&self, warnings: &[ScanWarning]) -> Result<String> {
        if warnings.is_empty() {
            return Ok(String::new());
        }

        let mut out = format!("{} session(s) skipped:\n", warnings.len());
        for warning in warnings {
            out.push_str("  ");
            out.push_str(&warning.to_string());
            out.push('\n');
        }
        Ok(out)
    }
}

/// JSON formatter for machine-readable output
pub struct JsonFormatter;

impl JsonFormatter {
    fn to_pretty<T: Serialize + ?Sized>(value: &T) -> Result<String> {
        serde_json::to_string_pretty(value)
            .map_err(|e| ClawstatError::Serialization(e.to_string()))
    }
}

impl OutputFormatter for JsonFormatter {
    fn format_report(&self, report: &UsageReport) -> Result<String> {
        Self::to_pretty(report)
    }

    fn format_sessions(&self, data: &[SessionUsage], totals: &Totals) -> Result<String> {
        Self::to_pretty(&sessions_json(data, totals))
    }

    fn format_warnings(&self, warnings: &[ScanWarning]) -> Result<String> {
        Self::to_pretty(&json!({ "warnings": warnings }))
    }
}

/// JSON body for a per-session breakdown
///
/// Shared by the JSON formatter and the HTTP endpoint so both emit the same
/// shape.
pub fn sessions_json(data: &[SessionUsage], totals: &Totals) -> serde_json::Value {
    json!({
        "sessions": data,
        "totals": {
            "tokens": {
                "prompt_tokens": totals.tokens.prompt_tokens,
                "completion_tokens": totals.tokens.completion_tokens,
                "total": totals.tokens.total(),
            },
            "estimatedCost": totals.estimated_cost,
        }
    })
}

/// Get appropriate formatter based on JSON flag
///
/// # Examples
///
/// ```
/// use clawstat::output::get_formatter;
/// use clawstat::aggregation::UsageReport;
///
/// let output = get_formatter(true).format_report(&UsageReport::default()).unwrap();
/// assert!(output.contains("\"byModel\""));
/// ```
pub fn get_formatter(json: bool) -> Box<dyn OutputFormatter> {
    if json {
        Box::new(JsonFormatter)
    } else {
        Box::new(TableFormatter)
    }
}
