//! Transformation run reports

use crate::protocol::RowError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// The rule that stopped a pipeline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleFailure {
    pub rule_id: String,
    pub message: String,
}

impl fmt::Display for RuleFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rule '{}': {}", self.rule_id, self.message)
    }
}

/// Summary of one pipeline run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransformationReport {
    /// Values written per output field
    pub fields_modified: BTreeMap<String, usize>,
    /// Output rows touched by at least one rule
    pub rows_affected: usize,
    /// Rows dropped by filters
    pub rows_removed: usize,
    /// Ids of rules that ran, in order
    pub rules_applied: Vec<String>,
    /// Ids of disabled rules
    pub rules_skipped: Vec<String>,
    /// Recovered per-value failures
    pub errors: Vec<RowError>,
    /// Set when a malformed rule stopped the run; output stops at the prior rule
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub halted: Option<RuleFailure>,
    /// Whether a cancellation request stopped progress reporting early
    pub cancelled: bool,
}

impl TransformationReport {
    /// Create an empty report
    pub fn new() -> Self {
        Self::default()
    }

    /// Count `n` values written to `field`
    pub fn record(&mut self, field: &str, n: usize) {
        if n == 0 {
            return;
        }
        *self.fields_modified.entry(field.to_string()).or_insert(0) += n;
    }

    /// Record a recovered failure
    pub fn add_error(&mut self, error: RowError) {
        self.errors.push(error);
    }

    /// Whether every enabled rule ran
    pub fn is_complete(&self) -> bool {
        self.halted.is_none()
    }

    /// Emit the report as structured log events
    pub fn log_summary(&self) {
        tracing::info!(
            rules_applied = self.rules_applied.len(),
            rules_skipped = self.rules_skipped.len(),
            rows_affected = self.rows_affected,
            rows_removed = self.rows_removed,
            errors = self.errors.len(),
            cancelled = self.cancelled,
            "Transformation summary"
        );
        if let Some(failure) = &self.halted {
            tracing::warn!(
                rule_id = %failure.rule_id,
                reason = %failure.message,
                "Pipeline halted; output stops at the previous rule"
            );
        }
    }

    /// Format the report for console output
    pub fn format_console(&self) -> String {
        let mut output = String::new();

        output.push('\n');
        output.push_str("═══════════════════════════════════════════════════════════════\n");
        output.push_str("                  TRANSFORMATION REPORT                        \n");
        output.push_str("═══════════════════════════════════════════════════════════════\n");
        output.push('\n');

        output.push_str("📊 SUMMARY\n");
        output.push_str("───────────────────────────────────────────────────────────────\n");
        output.push_str(&format!("  Rules Applied:     {}\n", self.rules_applied.len()));
        output.push_str(&format!("  Rules Skipped:     {}\n", self.rules_skipped.len()));
        output.push_str(&format!("  Rows Affected:     {}\n", self.rows_affected));
        output.push_str(&format!("  Rows Removed:      {}\n", self.rows_removed));
        output.push_str(&format!("  Errors:            {}\n", self.errors.len()));
        if self.cancelled {
            output.push_str("  Cancelled:         yes (drained to completion)\n");
        }
        output.push('\n');

        if let Some(failure) = &self.halted {
            output.push_str("⛔ HALTED\n");
            output.push_str("───────────────────────────────────────────────────────────────\n");
            output.push_str(&format!("  {failure}\n\n"));
        }

        if !self.fields_modified.is_empty() {
            output.push_str("🔧 FIELDS\n");
            output.push_str("───────────────────────────────────────────────────────────────\n");
            for (field, count) in &self.fields_modified {
                output.push_str(&format!("  {field:36} {count:>7}\n"));
            }
            output.push('\n');
        }

        if !self.errors.is_empty() {
            output.push_str("⚠️  ERRORS\n");
            output.push_str("───────────────────────────────────────────────────────────────\n");
            for error in self.errors.iter().take(20) {
                output.push_str(&format!("  • {error}\n"));
            }
            if self.errors.len() > 20 {
                output.push_str(&format!("  … and {} more\n", self.errors.len() - 20));
            }
            output.push('\n');
        }

        output.push_str("═══════════════════════════════════════════════════════════════\n");
        output
    }
}
