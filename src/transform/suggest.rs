//! Transformation suggestions
//!
//! Looks at a bounded sample and proposes rules a caller may enqueue. Nothing
//! is applied here. Suggestions come out in the order convert, format,
//! calculate, aggregate, so the list can be run as a pipeline unchanged.

use crate::domain::{as_number, infer_schema, parse_bool, parse_date, parse_number, DataRecord};
use crate::domain::{FieldType, SchemaField};
use crate::transform::operations::format::detect_case;
use crate::transform::rules::{
    AggregateFunction, AggregateParams, Aggregation, CalcOperation, CalculateParams, CaseStyle,
    FormatParams, TargetType, TransformKind, TransformRule,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;

/// Rows inspected by default
pub const DEFAULT_SAMPLE_LIMIT: usize = 500;

/// Non-null values a field needs before anything is suggested for it
pub const DEFAULT_MIN_SAMPLE_SIZE: usize = 5;

/// Cap on proposed derived fields
pub const DEFAULT_MAX_CALCULATIONS: usize = 3;

/// Most distinct values a field may have to count as categorical
const MAX_CATEGORIES: usize = 10;

/// Proposed rules, ready to be enqueued
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Suggestions {
    pub suggestions: Vec<TransformRule>,
}

impl Suggestions {
    pub fn is_empty(&self) -> bool {
        self.suggestions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.suggestions.len()
    }
}

/// Strategy that proposes transformation rules for a dataset
pub trait TransformSuggester: Send + Sync {
    /// Propose rules; never fails, returns nothing for thin samples
    fn suggest(&self, data: &[DataRecord], schema: &[SchemaField]) -> Suggestions;
}

/// Default suggester built on value-shape heuristics
#[derive(Debug, Clone)]
pub struct HeuristicSuggester {
    sample_limit: usize,
    min_sample_size: usize,
    max_calculations: usize,
}

impl Default for HeuristicSuggester {
    fn default() -> Self {
        Self::new()
    }
}

/// Sampled values of one field
struct Column<'a> {
    field: &'a SchemaField,
    values: Vec<&'a Value>,
}

impl Column<'_> {
    fn strings(&self) -> Option<Vec<&str>> {
        self.values.iter().map(|v| v.as_str()).collect()
    }

    fn name(&self) -> &str {
        &self.field.name
    }
}

impl HeuristicSuggester {
    pub fn new() -> Self {
        Self {
            sample_limit: DEFAULT_SAMPLE_LIMIT,
            min_sample_size: DEFAULT_MIN_SAMPLE_SIZE,
            max_calculations: DEFAULT_MAX_CALCULATIONS,
        }
    }

    pub fn with_sample_limit(mut self, sample_limit: usize) -> Self {
        self.sample_limit = sample_limit.max(1);
        self
    }

    pub fn with_min_sample_size(mut self, min_sample_size: usize) -> Self {
        self.min_sample_size = min_sample_size.max(1);
        self
    }

    pub fn with_max_calculations(mut self, max_calculations: usize) -> Self {
        self.max_calculations = max_calculations;
        self
    }

    fn suggest_convert(&self, column: &Column<'_>) -> Option<TargetType> {
        if column.field.field_type != FieldType::Text {
            return None;
        }
        let strings = column.strings()?;

        let numbers: Option<Vec<f64>> = strings.iter().map(|s| parse_number(s)).collect();
        if let Some(numbers) = numbers {
            return Some(if numbers.iter().all(|n| n.fract() == 0.0) {
                TargetType::Integer
            } else {
                TargetType::Number
            });
        }
        if strings.iter().all(|s| parse_bool(s).is_some()) {
            return Some(TargetType::Boolean);
        }
        if strings.iter().all(|s| parse_date(s).is_some()) {
            return Some(TargetType::Date);
        }
        None
    }

    fn suggest_format(&self, column: &Column<'_>) -> Option<FormatParams> {
        if !column.field.field_type.is_textual() {
            return None;
        }
        let strings = column.strings()?;

        let untrimmed = strings.iter().any(|s| s.trim() != *s);
        let doubled = strings.iter().any(|s| s.contains("  "));

        // Lower, Upper, Title
        let mut counts = [0usize; 3];
        for s in &strings {
            match detect_case(s.trim()) {
                Some(CaseStyle::Lower) => counts[0] += 1,
                Some(CaseStyle::Upper) => counts[1] += 1,
                Some(CaseStyle::Title) => counts[2] += 1,
                _ => {}
            }
        }
        let mixed_case = counts.iter().filter(|c| **c > 0).count() > 1;

        if !(untrimmed || doubled || mixed_case) {
            return None;
        }

        let case = mixed_case.then(|| {
            let styles = [CaseStyle::Lower, CaseStyle::Upper, CaseStyle::Title];
            let mut best = 0;
            for i in 1..styles.len() {
                if counts[i] > counts[best] {
                    best = i;
                }
            }
            styles[best]
        });

        Some(FormatParams {
            case,
            trim: true,
            collapse_whitespace: doubled,
            date_format: None,
        })
    }

    fn is_categorical(&self, column: &Column<'_>) -> bool {
        let Some(strings) = column.strings() else {
            return false;
        };
        let distinct: HashSet<&str> = strings.iter().copied().collect();
        (2..=MAX_CATEGORIES).contains(&distinct.len()) && distinct.len() * 2 <= strings.len()
    }
}

impl TransformSuggester for HeuristicSuggester {
    fn suggest(&self, data: &[DataRecord], schema: &[SchemaField]) -> Suggestions {
        let sample = &data[..data.len().min(self.sample_limit)];
        let schema = if schema.is_empty() {
            infer_schema(sample)
        } else {
            schema.to_vec()
        };

        let columns: Vec<Column<'_>> = schema
            .iter()
            .map(|field| Column {
                field,
                values: sample
                    .iter()
                    .filter_map(|r| r.get(&field.name))
                    .filter(|v| !v.is_null())
                    .collect(),
            })
            .filter(|c| c.values.len() >= self.min_sample_size)
            .collect();

        let mut suggestions = Vec::new();
        let mut converted: HashSet<&str> = HashSet::new();
        let mut numeric: Vec<&Column<'_>> = Vec::new();

        for column in &columns {
            if let Some(to_type) = self.suggest_convert(column) {
                suggestions.push(TransformRule::convert(
                    format!("suggest-convert-{}", column.name()),
                    column.name(),
                    to_type,
                ));
                converted.insert(column.name());
                if matches!(to_type, TargetType::Integer | TargetType::Number) {
                    numeric.push(column);
                }
            } else if column.field.field_type == FieldType::Number {
                numeric.push(column);
            }
        }

        for column in columns.iter().filter(|c| !converted.contains(c.name())) {
            if let Some(params) = self.suggest_format(column) {
                suggestions.push(TransformRule::new(
                    format!("suggest-format-{}", column.name()),
                    column.name(),
                    TransformKind::Format(params),
                ));
            }
        }

        // keep schema order for pairs
        numeric.sort_by_key(|c| schema.iter().position(|f| f.name == c.name()));
        let mut calculations = 0;
        'pairs: for (i, left) in numeric.iter().enumerate() {
            for right in &numeric[i + 1..] {
                if calculations >= self.max_calculations {
                    break 'pairs;
                }
                let has_zero = right
                    .values
                    .iter()
                    .any(|v| as_number(v).map_or(true, |n| n == 0.0));
                let operation = if has_zero {
                    CalcOperation::Difference
                } else {
                    CalcOperation::Ratio
                };
                let target = format!("{}_{}_{}", left.name(), right.name(), operation);
                if schema.iter().any(|f| f.name == target) {
                    continue;
                }
                suggestions.push(
                    TransformRule::new(
                        format!("suggest-calculate-{target}"),
                        left.name(),
                        TransformKind::Calculate(CalculateParams {
                            operation,
                            operands: vec![right.name().to_string()],
                            separator: None,
                        }),
                    )
                    .with_target(target),
                );
                calculations += 1;
            }
        }

        let category = columns
            .iter()
            .filter(|c| c.field.field_type.is_textual() && !converted.contains(c.name()))
            .find(|c| self.is_categorical(c));
        if let Some(category) = category {
            let aggregations: Vec<Aggregation> = numeric
                .iter()
                .map(|c| Aggregation {
                    field: c.name().to_string(),
                    function: AggregateFunction::Sum,
                    alias: None,
                })
                .collect();
            let include_count = aggregations.is_empty();
            suggestions.push(TransformRule::new(
                format!("suggest-aggregate-{}", category.name()),
                category.name(),
                TransformKind::Aggregate(AggregateParams {
                    group_by: vec![category.name().to_string()],
                    aggregations,
                    function: None,
                    include_count,
                }),
            ));
        }

        tracing::debug!(
            rows = sample.len(),
            suggestions = suggestions.len(),
            "Transformation analysis complete"
        );
        Suggestions { suggestions }
    }
}

/// Propose rules with the default suggester
pub fn analyze_for_transformations(data: &[DataRecord], schema: &[SchemaField]) -> Suggestions {
    HeuristicSuggester::new().suggest(data, schema)
}
