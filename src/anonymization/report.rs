//! Anonymization run reports
//!
//! A report says which fields were changed, by which method, and how many
//! values each. Originals never appear in it; [`FieldModification::sample_digest`]
//! carries seeded SHA-256 digests of the first few originals per field so a
//! run can be audited against source data without exposing it.

use crate::anonymization::rules::MethodKind;
use crate::protocol::RowError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Audit digests kept per field
pub const MAX_SAMPLE_DIGESTS: usize = 5;

/// What happened to one field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldModification {
    /// Method applied
    pub method: MethodKind,
    /// Values replaced (nulls are not counted)
    pub count: usize,
    /// Digests of the first few originals
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sample_digest: Vec<String>,
}

/// Summary of one anonymization run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnonymizationReport {
    /// Per-field modifications, keyed by field name
    pub fields_modified: BTreeMap<String, FieldModification>,
    /// Rows with at least one changed value
    pub rows_affected: usize,
    /// Recovered per-value failures
    pub errors: Vec<RowError>,
    /// Whether a cancellation request stopped progress reporting early
    pub cancelled: bool,
}

impl AnonymizationReport {
    /// Create an empty report
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one modified value
    pub fn record(&mut self, field: &str, method: MethodKind, digest: Option<String>) {
        let entry = self
            .fields_modified
            .entry(field.to_string())
            .or_insert_with(|| FieldModification {
                method,
                count: 0,
                sample_digest: Vec::new(),
            });
        entry.count += 1;
        if let Some(digest) = digest {
            if entry.sample_digest.len() < MAX_SAMPLE_DIGESTS {
                entry.sample_digest.push(digest);
            }
        }
    }

    /// Whether another audit digest would be kept for `field`
    pub fn wants_sample(&self, field: &str) -> bool {
        self.fields_modified
            .get(field)
            .map_or(true, |m| m.sample_digest.len() < MAX_SAMPLE_DIGESTS)
    }

    /// Record a recovered failure
    pub fn add_error(&mut self, error: RowError) {
        self.errors.push(error);
    }

    /// Total values replaced across all fields
    pub fn total_modifications(&self) -> usize {
        self.fields_modified.values().map(|m| m.count).sum()
    }

    /// Emit the report as structured log events
    pub fn log_summary(&self) {
        tracing::info!(
            fields = self.fields_modified.len(),
            values = self.total_modifications(),
            rows_affected = self.rows_affected,
            errors = self.errors.len(),
            cancelled = self.cancelled,
            "Anonymization summary"
        );
        for (field, modification) in &self.fields_modified {
            tracing::debug!(
                field = %field,
                method = %modification.method,
                count = modification.count,
                "Field anonymized"
            );
        }
        if !self.errors.is_empty() {
            tracing::warn!(
                errors = self.errors.len(),
                "Some values could not be anonymized and were set to null"
            );
        }
    }

    /// Format the report for console output
    pub fn format_console(&self) -> String {
        let mut output = String::new();

        output.push('\n');
        output.push_str("═══════════════════════════════════════════════════════════════\n");
        output.push_str("                    ANONYMIZATION REPORT                       \n");
        output.push_str("═══════════════════════════════════════════════════════════════\n");
        output.push('\n');

        output.push_str("📊 SUMMARY\n");
        output.push_str("───────────────────────────────────────────────────────────────\n");
        output.push_str(&format!("  Rows Affected:     {}\n", self.rows_affected));
        output.push_str(&format!(
            "  Values Replaced:   {}\n",
            self.total_modifications()
        ));
        output.push_str(&format!("  Errors:            {}\n", self.errors.len()));
        if self.cancelled {
            output.push_str("  Cancelled:         yes (drained to completion)\n");
        }
        output.push('\n');

        if !self.fields_modified.is_empty() {
            output.push_str("🔒 FIELDS\n");
            output.push_str("───────────────────────────────────────────────────────────────\n");
            for (field, modification) in &self.fields_modified {
                output.push_str(&format!(
                    "  {:24} {:12} {:>7}\n",
                    field,
                    modification.method.to_string(),
                    modification.count
                ));
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
