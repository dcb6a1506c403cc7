//! Output formatting for CLI commands.
//!
//! This module provides formatting utilities for displaying
//! information to the user in various formats.

use colored::Colorize;
use serde::Serialize;
use std::fmt::Write;
use tabled::{Table, Tabled};

use crate::config::ValidationResult;
use crate::merge::ListDiff;
use crate::reconciler::{ListReconciliation, ReconciliationReport};
use crate::state::SyncState;

use super::commands::OutputFormat;

/// Output formatter for CLI.
#[derive(Debug)]
pub struct OutputFormatter {
    /// Output format.
    format: OutputFormat,
}

/// Per-list row for reconciliation and drift tables.
#[derive(Tabled)]
struct ListRow {
    #[tabled(rename = "List")]
    name: String,
    #[tabled(rename = "Items")]
    items: usize,
    #[tabled(rename = "Added")]
    added: String,
    #[tabled(rename = "Removed")]
    removed: String,
    #[tabled(rename = "Pages")]
    pages: u32,
    #[tabled(rename = "Notes")]
    notes: String,
}

/// Stored list row for state display.
#[derive(Tabled)]
struct StateRow {
    #[tabled(rename = "List")]
    name: String,
    #[tabled(rename = "Items")]
    items: usize,
    #[tabled(rename = "Updated")]
    updated: String,
}

/// Ordered element row.
#[derive(Tabled)]
struct ItemRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "Key")]
    key: String,
}

impl OutputFormatter {
    /// Creates a new output formatter.
    #[must_use]
    pub const fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Formats the result of a standalone merge.
    #[must_use]
    pub fn format_merge(&self, merged: &[String], diff: &ListDiff<String>) -> String {
        match self.format {
            OutputFormat::Json => {
                to_json(&serde_json::json!({ "merged": merged, "diff": diff }))
            }
            OutputFormat::Text => {
                let mut output = Self::format_items(merged);
                let _ = write!(output, "\n{} {diff}\n", "Merge:".bold());
                output
            }
        }
    }

    /// Formats the keys of a fetched list.
    #[must_use]
    pub fn format_fetch(&self, name: &str, keys: &[String], pages: u32) -> String {
        match self.format {
            OutputFormat::Json => to_json(&serde_json::json!({
                "list": name,
                "pages": pages,
                "items": keys,
            })),
            OutputFormat::Text => {
                let mut output = format!("\n{} {name}\n\n", "List:".bold());
                output.push_str(&Self::format_items(keys));
                let _ = write!(output, "\n{} items in {pages} pages\n", keys.len());
                output
            }
        }
    }

    /// Formats a reconciliation report.
    #[must_use]
    pub fn format_reconciliation(&self, report: &ReconciliationReport) -> String {
        match self.format {
            OutputFormat::Json => to_json(report),
            OutputFormat::Text => {
                let status = if report.success() {
                    format!("{} Reconciliation successful", "✓".green())
                } else {
                    format!("{} Reconciliation failed", "✗".red())
                };

                let mut output = format!("{status}\n\n");
                output.push_str(&Self::format_report_body(report));
                output
            }
        }
    }

    /// Formats a drift report.
    #[must_use]
    pub fn format_drift(&self, report: &ReconciliationReport) -> String {
        match self.format {
            OutputFormat::Json => to_json(report),
            OutputFormat::Text => {
                let mut output = if report.has_changes() {
                    format!("{} Drift detected\n\n", "⚠".yellow())
                } else {
                    format!("{} No drift detected - stored lists are current\n\n", "✓".green())
                };
                output.push_str(&Self::format_report_body(report));
                output
            }
        }
    }

    /// Formats a validation result.
    #[must_use]
    pub fn format_validation(&self, result: &ValidationResult, show_warnings: bool) -> String {
        match self.format {
            OutputFormat::Json => {
                let errors: Vec<String> = result.errors.iter().map(ToString::to_string).collect();
                to_json(&serde_json::json!({
                    "valid": result.is_valid(),
                    "errors": errors,
                    "warnings": result.warnings,
                }))
            }
            OutputFormat::Text => {
                let mut output = if result.is_valid() {
                    format!("{} Configuration is valid\n", "✓".green())
                } else {
                    let mut text = format!(
                        "{} Configuration has {} errors:\n",
                        "✗".red(),
                        result.error_count()
                    );
                    for error in &result.errors {
                        let _ = writeln!(text, "   - {error}");
                    }
                    text
                };

                if show_warnings && !result.warnings.is_empty() {
                    let _ = write!(output, "\n{} Warnings:\n", "⚠".yellow());
                    for warning in &result.warnings {
                        let _ = writeln!(output, "   - {warning}");
                    }
                }

                output
            }
        }
    }

    /// Formats the stored state, or a single stored list in full.
    #[must_use]
    pub fn format_state(&self, state: &SyncState, list: Option<&str>) -> String {
        if let Some(name) = list {
            return match self.format {
                OutputFormat::Json => to_json(&serde_json::json!({
                    "list": name,
                    "items": state.ordering(name),
                })),
                OutputFormat::Text => {
                    let mut output = format!("\n{} {name}\n\n", "List:".bold());
                    if state.get_list(name).is_some() {
                        output.push_str(&Self::format_items(state.ordering(name)));
                    } else {
                        output.push_str("   Not stored.\n");
                    }
                    output
                }
            };
        }

        match self.format {
            OutputFormat::Json => to_json(state),
            OutputFormat::Text => {
                let mut output = String::new();

                let _ = write!(output, "\n{}\n\n", "State".bold());
                let _ = writeln!(output, "   Version: {}", state.version);
                let _ = writeln!(output, "   Last updated: {}", state.last_updated);

                if state.lists.is_empty() {
                    output.push_str("\n   No lists stored.\n");
                    return output;
                }

                let rows: Vec<StateRow> = state
                    .lists
                    .iter()
                    .map(|(name, list)| StateRow {
                        name: name.clone(),
                        items: list.len(),
                        updated: list.updated_at.format("%Y-%m-%d %H:%M").to_string(),
                    })
                    .collect();

                output.push('\n');
                output.push_str(&Table::new(rows).to_string());
                output.push('\n');
                output
            }
        }
    }

    /// Renders the per-list table and errors of a report.
    fn format_report_body(report: &ReconciliationReport) -> String {
        let mut output = String::new();

        if !report.lists.is_empty() {
            let rows: Vec<ListRow> = report.lists.iter().map(Self::list_row).collect();
            output.push_str(&Table::new(rows).to_string());
            output.push('\n');
        }

        if !report.errors.is_empty() {
            let _ = write!(output, "\n{} Errors:\n", "⚠".yellow());
            for (name, error) in &report.errors {
                let _ = writeln!(output, "   - {name}: {error}");
            }
        }

        output
    }

    /// Builds a table row for one list.
    fn list_row(list: &ListReconciliation) -> ListRow {
        let mut notes = Vec::new();
        if list.truncated {
            notes.push(String::from("truncated"));
        }
        if list.diff.reorder_suppressed {
            notes.push(String::from("remote order ignored"));
        }
        if list.skipped > 0 {
            notes.push(format!("{} without key", list.skipped));
        }
        if list.recovered_failures > 0 {
            notes.push(format!("{} retried", list.recovered_failures));
        }

        ListRow {
            name: list.name.clone(),
            items: list.items.len(),
            added: format!("+{}", list.diff.added.len()).green().to_string(),
            removed: format!("-{}", list.diff.removed.len()).red().to_string(),
            pages: list.pages_fetched,
            notes: notes.join(", "),
        }
    }

    /// Renders an ordering as an indexed table.
    fn format_items(keys: &[String]) -> String {
        if keys.is_empty() {
            return String::from("   (empty)\n");
        }

        let rows: Vec<ItemRow> = keys
            .iter()
            .enumerate()
            .map(|(i, key)| ItemRow {
                index: i + 1,
                key: Self::truncate(key, 60),
            })
            .collect();

        let mut output = Table::new(rows).to_string();
        output.push('\n');
        output
    }

    /// Truncates a string to a maximum number of characters.
    fn truncate(s: &str, max_len: usize) -> String {
        if s.chars().count() <= max_len {
            s.to_string()
        } else {
            let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
            format!("{kept}...")
        }
    }
}

/// Serializes a value as pretty JSON.
fn to_json<T: Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_default()
}
