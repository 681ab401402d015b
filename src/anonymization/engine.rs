//! Main anonymization engine
//!
//! This module provides the [`AnonymizationEngine`] that applies a rule set to
//! a dataset and reports what it changed.
//!
//! # Architecture
//!
//! A run has two phases:
//! - **Row phase**: every per-value method (mask, hash, fake, generalize,
//!   remove) is applied row by row, with a progress checkpoint every
//!   [`ProgressReporter::row_step`] rows
//! - **Column phase**: every shuffled field is permuted across the output of
//!   the row phase, one checkpoint per field
//!
//! All randomness derives from the run seed, so a repeated run with the same
//! seed produces identical output.
//!
//! # Examples
//!
//! ```no_run
//! use sieve::anonymization::{AnonymizationEngine, AnonymizeOptions};
//! use sieve::anonymization::rules::{AnonymizationMethod, AnonymizationRule, MaskParams};
//! use serde_json::json;
//!
//! # async fn example() -> sieve::domain::Result<()> {
//! let data = vec![json!({"email": "alice@example.com"}).as_object().unwrap().clone()];
//! let rules = vec![AnonymizationRule::new(
//!     "email",
//!     AnonymizationMethod::Mask(MaskParams::partial()),
//! )];
//!
//! let engine = AnonymizationEngine::new();
//! let outcome = engine.anonymize(&data, &rules, AnonymizeOptions::new("seed")).await?;
//! assert_eq!(outcome.anonymized_data[0]["email"], "a****@example.com");
//! # Ok(())
//! # }
//! ```

use crate::anonymization::anonymizer::{
    apply_value_method, hash, shuffle, FakeValueGenerator, FakerGenerator, FieldContext,
    ValueOutcome,
};
use crate::anonymization::report::AnonymizationReport;
use crate::anonymization::rules::{AnonymizationRule, MethodKind, RuleSet};
use crate::domain::{field_names, DataRecord, Result};
use crate::protocol::{ProgressReporter, RowError, RowErrorKind};
use crate::{log_batch_progress, log_run_complete, log_run_start};
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;

/// Share of the progress range given to the row phase when shuffles follow
const ROW_PHASE_SHARE: f64 = 90.0;

/// Per-run options
pub struct AnonymizeOptions {
    /// Seed for every deterministic method
    pub seed: String,
    /// Keep masked values the same length as the originals
    pub preserve_format: bool,
    /// Progress sink and cancel signal
    pub progress: ProgressReporter,
}

impl AnonymizeOptions {
    /// Options with the given seed, format preservation on, and no progress
    pub fn new(seed: impl Into<String>) -> Self {
        Self {
            seed: seed.into(),
            preserve_format: true,
            progress: ProgressReporter::silent(),
        }
    }

    /// Toggle format preservation
    pub fn with_preserve_format(mut self, preserve_format: bool) -> Self {
        self.preserve_format = preserve_format;
        self
    }

    /// Attach a progress reporter
    pub fn with_progress(mut self, progress: ProgressReporter) -> Self {
        self.progress = progress;
        self
    }
}

/// Output of an anonymization run
#[derive(Debug, Clone)]
pub struct AnonymizationOutcome {
    /// Anonymized rows, same length and order as the input
    pub anonymized_data: Vec<DataRecord>,
    /// What was changed
    pub report: AnonymizationReport,
}

/// Main anonymization engine
///
/// The engine holds no per-run state and can be shared across tasks behind
/// an `Arc`.
pub struct AnonymizationEngine {
    generator: Arc<dyn FakeValueGenerator>,
}

impl Default for AnonymizationEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl AnonymizationEngine {
    /// Create an engine with the default fake-value generator
    pub fn new() -> Self {
        Self {
            generator: Arc::new(FakerGenerator),
        }
    }

    /// Create an engine with a custom fake-value generator
    pub fn with_fake_generator(generator: Arc<dyn FakeValueGenerator>) -> Self {
        Self { generator }
    }

    /// Anonymize a dataset
    ///
    /// # Errors
    ///
    /// - [`SieveError::DuplicateRule`](crate::domain::SieveError::DuplicateRule)
    ///   for two rules on one field, or two wildcards
    /// - [`SieveError::UnknownField`](crate::domain::SieveError::UnknownField)
    ///   for a rule naming a field no row has (skipped for empty data)
    /// - [`SieveError::Cancelled`](crate::domain::SieveError::Cancelled)
    ///   when cancelled under [`CancelPolicy::AbortNow`](crate::protocol::CancelPolicy::AbortNow)
    ///
    /// Values a strategy cannot handle do not fail the run: they are set to
    /// null and listed in the report's `errors`.
    pub async fn anonymize(
        &self,
        data: &[DataRecord],
        rules: &[AnonymizationRule],
        options: AnonymizeOptions,
    ) -> Result<AnonymizationOutcome> {
        let start = Instant::now();
        let AnonymizeOptions {
            seed,
            preserve_format,
            mut progress,
        } = options;

        let rule_set = RuleSet::compile(rules)?;
        let mut report = AnonymizationReport::new();

        if data.is_empty() {
            progress.emit(100.0, "No rows to anonymize").await;
            return Ok(AnonymizationOutcome {
                anonymized_data: Vec::new(),
                report,
            });
        }

        let fields = field_names(data);
        rule_set.check_fields(&fields)?;

        log_run_start!("anonymize", data.len(), rules.len());

        let column_fields: Vec<&String> = fields
            .iter()
            .filter(|f| rule_set.resolve(f).is_some_and(|m| m.is_column_wide()))
            .collect();
        let row_share = if column_fields.is_empty() {
            100.0
        } else {
            ROW_PHASE_SHARE
        };

        let total = data.len();
        let step = progress.row_step(total);
        let mut touched = vec![false; total];
        let mut output: Vec<DataRecord> = Vec::with_capacity(total);

        for (row, record) in data.iter().enumerate() {
            let mut anonymized = DataRecord::with_capacity(record.len());

            for (field, value) in record {
                let method = match rule_set.resolve(field) {
                    Some(method) if !method.is_column_wide() => method,
                    _ => {
                        anonymized.insert(field.clone(), value.clone());
                        continue;
                    }
                };

                let ctx = FieldContext {
                    seed: &seed,
                    field,
                    preserve_format,
                    generator: self.generator.as_ref(),
                };

                let new_value = match apply_value_method(method, value, &ctx) {
                    ValueOutcome::Unchanged => value.clone(),
                    ValueOutcome::Replaced(replacement) => {
                        let digest = report
                            .wants_sample(field)
                            .then(|| hash::audit_digest(&seed, value));
                        report.record(field, method.kind(), digest);
                        touched[row] = true;
                        replacement
                    }
                    ValueOutcome::Failed(message) => {
                        report.record(field, method.kind(), None);
                        report.add_error(RowError::new(
                            RowErrorKind::Generalization,
                            row,
                            field.clone(),
                            message,
                        ));
                        touched[row] = true;
                        Value::Null
                    }
                };
                anonymized.insert(field.clone(), new_value);
            }

            output.push(anonymized);

            let processed = row + 1;
            if processed % step == 0 || processed == total {
                log_batch_progress!(processed, total);
                let percent = processed as f64 / total as f64 * row_share;
                progress
                    .checkpoint(
                        percent,
                        format!("Anonymized {processed}/{total} rows"),
                        processed,
                    )
                    .await?;
            }
        }

        for (i, field) in column_fields.iter().enumerate() {
            let original: Vec<Value> = output
                .iter()
                .map(|r| r.get(field.as_str()).cloned().unwrap_or(Value::Null))
                .collect();
            let mut column = original.clone();
            shuffle::shuffle_column(&mut column, &seed, field);

            for (row, (record, value)) in output.iter_mut().zip(column).enumerate() {
                if value != original[row] {
                    let digest = report
                        .wants_sample(field)
                        .then(|| hash::audit_digest(&seed, &original[row]));
                    report.record(field, MethodKind::Shuffle, digest);
                    touched[row] = true;
                }
                record.insert(field.to_string(), value);
            }

            let percent =
                ROW_PHASE_SHARE + (i + 1) as f64 / column_fields.len() as f64 * (100.0 - ROW_PHASE_SHARE);
            progress
                .checkpoint(percent, format!("Shuffled column '{field}'"), total)
                .await?;
        }

        report.rows_affected = touched.iter().filter(|t| **t).count();
        report.cancelled = progress.was_drained();
        progress.emit(100.0, "Anonymization complete").await;

        log_run_complete!("anonymize", total, start.elapsed());
        report.log_summary();

        Ok(AnonymizationOutcome {
            anonymized_data: output,
            report,
        })
    }
}

/// Anonymize a dataset with the default engine
pub async fn anonymize(
    data: &[DataRecord],
    rules: &[AnonymizationRule],
    options: AnonymizeOptions,
) -> Result<AnonymizationOutcome> {
    AnonymizationEngine::new()
        .anonymize(data, rules, options)
        .await
}
