//! Transformation pipeline executor
//!
//! Rules run strictly in order; each one sees the output and the schema left
//! by the rule before it.
//!
//! # Failure modes
//!
//! - A rule naming a field that will not exist at its position, a rename
//!   onto an existing field, or two rules sharing an id: the whole call fails
//!   with a validation error before any row is touched
//! - A rule with malformed parameters: the run stops there and returns the
//!   output of the previous rule, with [`TransformationReport::halted`] set
//! - A value a rule cannot handle: the value becomes `null` (or is kept, for
//!   format) and a [`RowError`] is added to the report
//!
//! # Examples
//!
//! ```no_run
//! use sieve::transform::{apply_transformations, TargetType, TransformRule, TransformationPipeline};
//! use sieve::protocol::ProgressReporter;
//! use serde_json::json;
//!
//! # async fn example() -> sieve::domain::Result<()> {
//! let data = vec![json!({"a": "5"}).as_object().unwrap().clone()];
//! let pipeline = TransformationPipeline::new(vec![
//!     TransformRule::rename("r1", "a", "b"),
//!     TransformRule::convert("r2", "b", TargetType::Number),
//! ]);
//!
//! let outcome = apply_transformations(&data, &[], &pipeline, ProgressReporter::silent()).await?;
//! assert_eq!(outcome.transformed_data[0]["b"], 5);
//! # Ok(())
//! # }
//! ```

use crate::domain::{find_field, infer_schema, DataRecord, Result, SchemaField, SieveError};
use crate::protocol::{ProgressReporter, RowError, RowErrorKind};
use crate::transform::operations::{
    aggregate::AggregatePlan, calculate, convert, filter::Predicate, format, rename,
};
use crate::transform::report::{RuleFailure, TransformationReport};
use crate::transform::rules::{
    CalcOperation, FormatParams, TargetType, TransformKind, TransformRule, TransformationPipeline,
};
use crate::{log_run_complete, log_run_start, log_rule_applied};
use serde_json::Value;
use std::collections::HashSet;
use std::time::Instant;

/// Output of a pipeline run
#[derive(Debug, Clone)]
pub struct TransformationOutcome {
    pub transformed_data: Vec<DataRecord>,
    /// Schema after the last rule that ran
    pub schema: Vec<SchemaField>,
    pub report: TransformationReport,
}

/// A rule resolved against the schema it will run on
enum Step {
    Rename {
        from: String,
        to: String,
    },
    Convert {
        field: String,
        to_type: TargetType,
    },
    Calculate {
        target: String,
        inputs: Vec<String>,
        operation: CalcOperation,
        separator: String,
    },
    Format {
        field: String,
        params: FormatParams,
    },
    Filter(Predicate),
    Aggregate(AggregatePlan),
}

struct PreparedRule {
    step: Step,
    schema: Vec<SchemaField>,
}

/// Check that every field a rule reads exists in `schema`
fn check_references(rule: &TransformRule, schema: &[SchemaField]) -> Result<()> {
    let context = format!("rule '{}' ({})", rule.id, rule.rule_type());
    let require = |field: &str| -> Result<()> {
        if find_field(schema, field).is_some() {
            Ok(())
        } else {
            Err(SieveError::unknown_field(context.clone(), field))
        }
    };

    require(&rule.source_field)?;

    match &rule.kind {
        TransformKind::Rename => {
            if let Some(target) = rule.target_field.as_deref() {
                if find_field(schema, target).is_some() {
                    return Err(SieveError::Validation(format!(
                        "{context} renames onto existing field '{target}'"
                    )));
                }
            }
        }
        TransformKind::Filter(params) => {
            if let Some(field) = params.field.as_deref() {
                require(field)?;
            }
        }
        TransformKind::Calculate(params) => {
            for operand in &params.operands {
                require(operand)?;
            }
        }
        TransformKind::Aggregate(params) => {
            for field in &params.group_by {
                require(field)?;
            }
            for aggregation in &params.aggregations {
                require(&aggregation.field)?;
            }
        }
        TransformKind::Convert(_) | TransformKind::Format(_) => {}
    }
    Ok(())
}

/// Resolve a rule's parameters; `Err` is always [`SieveError::Operation`]
fn prepare(
    rule: &TransformRule,
    schema: &[SchemaField],
    preserve_original: bool,
) -> Result<PreparedRule> {
    let malformed = |message: String| SieveError::operation(rule.id.clone(), message);
    let target = || {
        rule.target_field
            .clone()
            .ok_or_else(|| malformed(format!("{} rule needs a target_field", rule.rule_type())))
    };

    let prepared = match &rule.kind {
        TransformKind::Rename => {
            let to = target()?;
            PreparedRule {
                schema: rename::rename_schema(schema, &rule.source_field, &to, preserve_original),
                step: Step::Rename {
                    from: rule.source_field.clone(),
                    to,
                },
            }
        }
        TransformKind::Convert(params) => {
            let mut next = schema.to_vec();
            if let Some(field) = next.iter_mut().find(|f| f.name == rule.source_field) {
                field.field_type = convert::converted_field_type(params.to_type);
            }
            PreparedRule {
                schema: next,
                step: Step::Convert {
                    field: rule.source_field.clone(),
                    to_type: params.to_type,
                },
            }
        }
        TransformKind::Calculate(params) => {
            let target = target()?;
            let inputs: Vec<String> = std::iter::once(rule.source_field.clone())
                .chain(params.operands.iter().cloned())
                .collect();
            calculate::check_arity(params.operation, inputs.len()).map_err(malformed)?;

            let field_type = calculate::calculated_field_type(params.operation);
            let mut next = schema.to_vec();
            match next.iter_mut().find(|f| f.name == target) {
                Some(existing) => existing.field_type = field_type,
                None => next.push(SchemaField::new(target.clone(), field_type)),
            }
            PreparedRule {
                schema: next,
                step: Step::Calculate {
                    target,
                    inputs,
                    operation: params.operation,
                    separator: params.separator.clone().unwrap_or_else(|| " ".to_string()),
                },
            }
        }
        TransformKind::Format(params) => {
            if let Some(pattern) = params.date_format.as_deref() {
                format::validate_date_format(pattern).map_err(malformed)?;
            }
            PreparedRule {
                schema: schema.to_vec(),
                step: Step::Format {
                    field: rule.source_field.clone(),
                    params: params.clone(),
                },
            }
        }
        TransformKind::Filter(params) => PreparedRule {
            schema: schema.to_vec(),
            step: Step::Filter(Predicate::compile(&rule.source_field, params).map_err(malformed)?),
        },
        TransformKind::Aggregate(params) => {
            let plan = AggregatePlan::build(&rule.source_field, params, schema).map_err(malformed)?;
            PreparedRule {
                schema: plan.output_schema(schema),
                step: Step::Aggregate(plan),
            }
        }
    };
    Ok(prepared)
}

/// Validate a whole pipeline against a starting schema without running it
///
/// Walks the rules in order, evolving the schema the way the run would.
/// Stops quietly at the first malformed rule, since the run halts there.
///
/// # Errors
///
/// Returns a validation error for duplicate rule ids, unknown field
/// references, or a rename onto an existing field.
pub fn validate_pipeline(pipeline: &TransformationPipeline, schema: &[SchemaField]) -> Result<()> {
    let mut seen = HashSet::new();
    for rule in &pipeline.rules {
        if !seen.insert(rule.id.as_str()) {
            return Err(SieveError::Validation(format!(
                "duplicate rule id '{}'",
                rule.id
            )));
        }
    }

    let mut current = schema.to_vec();
    for rule in pipeline.rules.iter().filter(|r| r.enabled) {
        check_references(rule, &current)?;
        match prepare(rule, &current, pipeline.preserve_original) {
            Ok(prepared) => current = prepared.schema,
            Err(_) => break,
        }
    }
    Ok(())
}

/// Mutable state of one run
struct PipelineRun {
    rows: Vec<DataRecord>,
    touched: Vec<bool>,
    report: TransformationReport,
    progress: ProgressReporter,
    rule_index: usize,
    rule_count: usize,
}

impl PipelineRun {
    fn percent(&self, fraction: f64) -> f64 {
        (self.rule_index as f64 + fraction) / self.rule_count.max(1) as f64 * 100.0
    }

    /// Sub-rule checkpoint, only for datasets larger than one batch
    async fn row_checkpoint(&mut self, processed: usize) -> Result<()> {
        let total = self.rows.len();
        let batch = self.progress.batch_size();
        if total > batch && processed % batch == 0 && processed < total {
            let percent = self.percent(processed as f64 / total as f64);
            let message = format!(
                "Rule {}/{}: {processed}/{total} rows",
                self.rule_index + 1,
                self.rule_count
            );
            self.progress.checkpoint(percent, message, processed).await?;
        }
        Ok(())
    }

    async fn execute(&mut self, step: Step, preserve_original: bool) -> Result<()> {
        match step {
            Step::Rename { from, to } => self.rename(&from, &to, preserve_original).await,
            Step::Convert { field, to_type } => self.convert(&field, to_type).await,
            Step::Calculate {
                target,
                inputs,
                operation,
                separator,
            } => self.calculate(&target, &inputs, operation, &separator).await,
            Step::Format { field, params } => self.format(&field, &params).await,
            Step::Filter(predicate) => self.filter(&predicate).await,
            Step::Aggregate(plan) => {
                self.aggregate(&plan);
                Ok(())
            }
        }
    }

    async fn rename(&mut self, from: &str, to: &str, preserve_original: bool) -> Result<()> {
        let mut renamed = 0;
        for row in 0..self.rows.len() {
            if let Some(record) = rename::rename_record(&self.rows[row], from, to, preserve_original)
            {
                self.rows[row] = record;
                self.touched[row] = true;
                renamed += 1;
            }
            self.row_checkpoint(row + 1).await?;
        }
        self.report.record(to, renamed);
        Ok(())
    }

    async fn convert(&mut self, field: &str, to_type: TargetType) -> Result<()> {
        let mut changed = 0;
        for row in 0..self.rows.len() {
            let current = self.rows[row].get(field).cloned().unwrap_or(Value::Null);
            if !current.is_null() {
                let next = match convert::convert_value(&current, to_type) {
                    Ok(value) => value,
                    Err(message) => {
                        self.report.add_error(RowError::new(
                            RowErrorKind::Conversion,
                            row,
                            field,
                            message,
                        ));
                        Value::Null
                    }
                };
                if next != current {
                    self.rows[row].insert(field.to_string(), next);
                    self.touched[row] = true;
                    changed += 1;
                }
            }
            self.row_checkpoint(row + 1).await?;
        }
        self.report.record(field, changed);
        Ok(())
    }

    async fn calculate(
        &mut self,
        target: &str,
        inputs: &[String],
        operation: CalcOperation,
        separator: &str,
    ) -> Result<()> {
        let mut changed = 0;
        for row in 0..self.rows.len() {
            let value = match calculate::calculate(&self.rows[row], inputs, operation, separator) {
                Ok(value) => value,
                Err(message) => {
                    self.report.add_error(RowError::new(
                        RowErrorKind::Calculation,
                        row,
                        target,
                        message,
                    ));
                    Value::Null
                }
            };
            let record = &mut self.rows[row];
            if record.get(target) != Some(&value) {
                record.insert(target.to_string(), value);
                self.touched[row] = true;
                changed += 1;
            }
            self.row_checkpoint(row + 1).await?;
        }
        self.report.record(target, changed);
        Ok(())
    }

    async fn format(&mut self, field: &str, params: &FormatParams) -> Result<()> {
        let mut changed = 0;
        for row in 0..self.rows.len() {
            if let Some(Value::String(text)) = self.rows[row].get(field) {
                let formatted = format::format_text(text, params);
                if let Some(message) = formatted.date_error {
                    self.report
                        .add_error(RowError::new(RowErrorKind::Format, row, field, message));
                }
                if formatted.text != *text {
                    self.rows[row].insert(field.to_string(), Value::String(formatted.text));
                    self.touched[row] = true;
                    changed += 1;
                }
            }
            self.row_checkpoint(row + 1).await?;
        }
        self.report.record(field, changed);
        Ok(())
    }

    async fn filter(&mut self, predicate: &Predicate) -> Result<()> {
        let mut keep = Vec::with_capacity(self.rows.len());
        for row in 0..self.rows.len() {
            keep.push(predicate.matches(&self.rows[row]));
            self.row_checkpoint(row + 1).await?;
        }

        let before = self.rows.len();
        let rows = std::mem::take(&mut self.rows);
        let touched = std::mem::take(&mut self.touched);
        (self.rows, self.touched) = rows
            .into_iter()
            .zip(touched)
            .zip(keep)
            .filter_map(|(pair, kept)| kept.then_some(pair))
            .unzip();

        let removed = before - self.rows.len();
        self.report.rows_removed += removed;
        tracing::debug!(field = predicate.field(), removed, "Filter applied");
        Ok(())
    }

    fn aggregate(&mut self, plan: &AggregatePlan) {
        let (rows, errors) = plan.apply(&self.rows);
        for aggregation in &plan.aggregations {
            self.report.record(&aggregation.output, rows.len());
        }
        self.report.errors.extend(errors);
        self.touched = vec![true; rows.len()];
        self.rows = rows;
    }
}

/// Stateless pipeline executor
#[derive(Debug, Clone, Copy, Default)]
pub struct PipelineExecutor;

impl PipelineExecutor {
    pub fn new() -> Self {
        Self
    }

    /// Run a pipeline over a dataset
    ///
    /// An empty `schema` is inferred from `data`.
    ///
    /// # Errors
    ///
    /// - [`SieveError::Validation`] / [`SieveError::UnknownField`] for the
    ///   structural problems listed in the module docs
    /// - [`SieveError::Cancelled`] when cancelled under
    ///   [`CancelPolicy::AbortNow`](crate::protocol::CancelPolicy::AbortNow)
    pub async fn run(
        &self,
        data: &[DataRecord],
        schema: &[SchemaField],
        pipeline: &TransformationPipeline,
        progress: ProgressReporter,
    ) -> Result<TransformationOutcome> {
        let start = Instant::now();
        let mut schema = if schema.is_empty() {
            infer_schema(data)
        } else {
            schema.to_vec()
        };

        validate_pipeline(pipeline, &schema)?;
        log_run_start!("transform", data.len(), pipeline.rules.len());

        let mut run = PipelineRun {
            rows: data.to_vec(),
            touched: vec![false; data.len()],
            report: TransformationReport::new(),
            progress,
            rule_index: 0,
            rule_count: pipeline.rules.len(),
        };

        if pipeline.rules.is_empty() {
            run.progress.emit(100.0, "No rules to apply").await;
        }

        for (i, rule) in pipeline.rules.iter().enumerate() {
            run.rule_index = i;

            if rule.enabled {
                match prepare(rule, &schema, pipeline.preserve_original) {
                    Ok(prepared) => {
                        run.execute(prepared.step, pipeline.preserve_original)
                            .await?;
                        schema = prepared.schema;
                        run.report.rules_applied.push(rule.id.clone());
                        log_rule_applied!(rule.id, rule.rule_type(), run.rows.len());
                    }
                    Err(SieveError::Operation { rule_id, message }) => {
                        tracing::warn!(rule_id = %rule_id, reason = %message, "Pipeline halted");
                        run.report.halted = Some(RuleFailure { rule_id, message });
                        run.progress
                            .emit(100.0, format!("Halted at rule '{}'", rule.id))
                            .await;
                        break;
                    }
                    Err(other) => return Err(other),
                }
            } else {
                tracing::debug!(rule_id = %rule.id, "Rule disabled, skipping");
                run.report.rules_skipped.push(rule.id.clone());
            }

            let done = i + 1;
            run.progress
                .checkpoint(
                    done as f64 / run.rule_count as f64 * 100.0,
                    format!("{done}/{} rules complete", run.rule_count),
                    done,
                )
                .await?;
        }

        let PipelineRun {
            rows,
            touched,
            mut report,
            progress,
            ..
        } = run;
        report.rows_affected = touched.iter().filter(|t| **t).count();
        report.cancelled = progress.was_drained();

        log_run_complete!("transform", rows.len(), start.elapsed());
        report.log_summary();

        Ok(TransformationOutcome {
            transformed_data: rows,
            schema,
            report,
        })
    }
}

/// Run a pipeline with the default executor
pub async fn apply_transformations(
    data: &[DataRecord],
    schema: &[SchemaField],
    pipeline: &TransformationPipeline,
    progress: ProgressReporter,
) -> Result<TransformationOutcome> {
    PipelineExecutor::new()
        .run(data, schema, pipeline, progress)
        .await
}
