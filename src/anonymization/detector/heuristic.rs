//! Heuristic PII detector
//!
//! Scores every field against every [`PiiType`] from three signals:
//!
//! | Signal        | Score                                         |
//! |---------------|-----------------------------------------------|
//! | field name    | 0.8 exact, 0.6 token (see [`Vocabulary`])     |
//! | schema type   | 0.7 when the declared type implies the PII    |
//! | sampled values| validator weight × share of matching values   |
//!
//! The field's confidence for a type is the strongest signal, plus 0.15 when
//! two or more signals agree, capped at 1.0. The best type wins; ties go to
//! the type listed first in [`PiiType::ALL`].

use super::patterns::{self, Vocabulary};
use super::{DetectedField, DetectionResult, PiiDetector, PiiType, RuleTable};
use crate::domain::{display_text, DataRecord, FieldType, SchemaField};
use std::sync::Arc;

const SCHEMA_HINT_SCORE: f64 = 0.7;
const AGREEMENT_BONUS: f64 = 0.15;
/// Share of sampled values that must match before the value signal counts
const VALUE_SIGNAL_MIN_RATIO: f64 = 0.5;
const MAX_SAMPLES: usize = 3;

/// Default confidence a field must exceed to be reported
pub const DEFAULT_CONFIDENCE_THRESHOLD: f64 = 0.5;
/// Default number of rows sampled per field
pub const DEFAULT_SAMPLE_SIZE: usize = 1000;

/// Field-name, schema and value-shape detector
#[derive(Debug, Clone)]
pub struct HeuristicDetector {
    vocabulary: Arc<Vocabulary>,
    rule_table: RuleTable,
    confidence_threshold: f64,
    sample_size: usize,
}

impl Default for HeuristicDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl HeuristicDetector {
    /// Create a detector with the built-in vocabulary and rule table
    pub fn new() -> Self {
        Self {
            vocabulary: Arc::new(Vocabulary::builtin()),
            rule_table: RuleTable::default(),
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            sample_size: DEFAULT_SAMPLE_SIZE,
        }
    }

    /// Use a custom vocabulary
    pub fn with_vocabulary(mut self, vocabulary: Vocabulary) -> Self {
        self.vocabulary = Arc::new(vocabulary);
        self
    }

    /// Use a custom rule table for suggestions
    pub fn with_rule_table(mut self, rule_table: RuleTable) -> Self {
        self.rule_table = rule_table;
        self
    }

    /// Set the reporting threshold (clamped to `[0, 1]`)
    pub fn with_confidence_threshold(mut self, threshold: f64) -> Self {
        self.confidence_threshold = threshold.clamp(0.0, 1.0);
        self
    }

    /// Set how many rows are sampled per field (at least one)
    pub fn with_sample_size(mut self, sample_size: usize) -> Self {
        self.sample_size = sample_size.max(1);
        self
    }

    fn score_field(
        &self,
        field: &str,
        declared: FieldType,
        values: &[String],
    ) -> Option<(PiiType, f64)> {
        let mut best: Option<(PiiType, f64)> = None;

        for pii_type in PiiType::ALL {
            let name = self.vocabulary.name_score(pii_type, field);
            let schema = if implied_pii(declared) == Some(pii_type) {
                SCHEMA_HINT_SCORE
            } else {
                0.0
            };
            let value = value_score(pii_type, values);

            let signals = [name, schema, value].iter().filter(|s| **s > 0.0).count();
            let strongest = name.max(schema).max(value);
            let bonus = if signals >= 2 { AGREEMENT_BONUS } else { 0.0 };
            let confidence = (strongest + bonus).min(1.0);

            if best.map_or(true, |(_, c)| confidence > c) {
                best = Some((pii_type, confidence));
            }
        }

        best.filter(|(_, c)| *c > 0.0)
    }
}

impl PiiDetector for HeuristicDetector {
    fn detect(&self, data: &[DataRecord], schema: &[SchemaField]) -> DetectionResult {
        let mut result = DetectionResult::default();
        if data.is_empty() || schema.is_empty() {
            return result;
        }

        for column in schema {
            let field = column.name.as_str();
            let values: Vec<String> = data
                .iter()
                .take(self.sample_size)
                .filter_map(|record| record.get(field))
                .filter_map(display_text)
                .collect();

            let Some((pii_type, confidence)) = self.score_field(field, column.field_type, &values) else {
                continue;
            };

            tracing::debug!(
                field = %field,
                pii_type = %pii_type,
                confidence,
                "Scored field"
            );

            if confidence <= self.confidence_threshold {
                continue;
            }

            let mut samples: Vec<String> = Vec::new();
            for value in &values {
                if samples.len() >= MAX_SAMPLES {
                    break;
                }
                if !samples.contains(value) {
                    samples.push(value.clone());
                }
            }

            let detected = DetectedField {
                field: field.to_string(),
                pii_type,
                confidence,
                samples,
            };
            if let Some(rule) = self.rule_table.rule_for(&detected) {
                result.suggested_rules.push(rule);
            }
            result.detected_fields.push(detected);
        }

        tracing::info!(
            fields_detected = result.detected_fields.len(),
            rows_sampled = data.len().min(self.sample_size),
            "PII detection complete"
        );

        result
    }

    fn confidence_threshold(&self) -> f64 {
        self.confidence_threshold
    }
}

fn implied_pii(field_type: FieldType) -> Option<PiiType> {
    match field_type {
        FieldType::Email => Some(PiiType::Email),
        FieldType::Phone => Some(PiiType::Phone),
        FieldType::Address => Some(PiiType::Address),
        FieldType::Name => Some(PiiType::Name),
        _ => None,
    }
}

fn validator(pii_type: PiiType) -> (fn(&str) -> bool, f64) {
    match pii_type {
        PiiType::Email => (patterns::is_email, 0.95),
        PiiType::Ssn => (patterns::is_ssn, 0.95),
        PiiType::CreditCard => (patterns::is_credit_card, 0.95),
        PiiType::Phone => (patterns::is_phone, 0.75),
        PiiType::Address => (patterns::is_street_address, 0.7),
        PiiType::Id => (patterns::is_uuid, 0.6),
        PiiType::DateOfBirth => (patterns::is_birth_date, 0.5),
        PiiType::Name => (patterns::is_person_name, 0.4),
    }
}

fn value_score(pii_type: PiiType, values: &[String]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let (matches, weight) = validator(pii_type);
    let hits = values.iter().filter(|v| matches(v)).count();
    let ratio = hits as f64 / values.len() as f64;
    if ratio < VALUE_SIGNAL_MIN_RATIO {
        0.0
    } else {
        weight * ratio
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::infer_schema;
    use serde_json::json;

    fn records(value: serde_json::Value) -> Vec<DataRecord> {
        value
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_object().unwrap().clone())
            .collect()
    }

    #[test]
    fn test_detects_email_by_name_and_values() {
        let data = records(json!([
            {"email": "alice@example.com", "amount": 10},
            {"email": "bob@example.com", "amount": 20}
        ]));
        let result = HeuristicDetector::new().detect(&data, &infer_schema(&data));

        assert_eq!(result.detected_fields.len(), 1);
        let email = &result.detected_fields[0];
        assert_eq!(email.pii_type, PiiType::Email);
        assert!((email.confidence - 1.0).abs() < 1e-9);
        assert_eq!(email.samples, vec!["alice@example.com", "bob@example.com"]);
        assert_eq!(result.suggested_rules.len(), 1);
    }

    #[test]
    fn test_detects_by_value_shape_alone() {
        let data = records(json!([
            {"contact": "alice@example.com"},
            {"contact": "bob@example.com"},
            {"contact": null}
        ]));
        let result = HeuristicDetector::new().detect(&data, &infer_schema(&data));
        assert_eq!(result.type_of("contact"), Some(PiiType::Email));
    }

    #[test]
    fn test_negative_tokens_suppress_name() {
        let data = records(json!([
            {"company_name": "Acme Corp", "file_name": "report.pdf"}
        ]));
        let result = HeuristicDetector::new().detect(&data, &infer_schema(&data));
        assert!(result.detected_fields.is_empty());
    }

    #[test]
    fn test_schema_hint_counts_as_signal() {
        let data = records(json!([{"who": "x"}]));
        let schema = vec![SchemaField::new("who", FieldType::Name)];
        let result = HeuristicDetector::new().detect(&data, &schema);
        assert_eq!(result.type_of("who"), Some(PiiType::Name));
    }

    #[test]
    fn test_threshold_is_strict() {
        // A date column with no name hint scores exactly 0.5
        let data = records(json!([{"created": "2024-01-02"}, {"created": "2024-02-03"}]));
        let result = HeuristicDetector::new().detect(&data, &infer_schema(&data));
        assert!(!result.is_detected("created"));

        let lenient = HeuristicDetector::new().with_confidence_threshold(0.4);
        assert!(lenient.detect(&data, &infer_schema(&data)).is_detected("created"));
    }

    #[test]
    fn test_samples_are_capped() {
        let data: Vec<DataRecord> = (0..10)
            .map(|i| {
                json!({"ssn": format!("123-45-{:04}", i)})
                    .as_object()
                    .unwrap()
                    .clone()
            })
            .collect();
        let result = HeuristicDetector::new().detect(&data, &infer_schema(&data));
        assert_eq!(result.detected_fields[0].pii_type, PiiType::Ssn);
        assert_eq!(result.detected_fields[0].samples.len(), 3);
    }

    #[test]
    fn test_empty_data_or_schema_detects_nothing() {
        let schema = vec![
            SchemaField::new("email", FieldType::Email),
            SchemaField::new("phone", FieldType::Text),
        ];
        let no_rows = HeuristicDetector::new().detect(&[], &schema);
        assert!(no_rows.detected_fields.is_empty());
        assert!(no_rows.suggested_rules.is_empty());

        let data = records(json!([{"email": "alice@example.com"}]));
        let no_schema = HeuristicDetector::new().detect(&data, &[]);
        assert!(no_schema.detected_fields.is_empty());
        assert!(no_schema.suggested_rules.is_empty());
    }
}
