//! PII detection module
//!
//! Provides the trait-based detection interface and the heuristic detector
//! used by default. Detection looks at three independent signals per field
//! (field name, declared schema type, sampled values) and suggests one
//! anonymization rule for every field it flags.

pub mod heuristic;
pub mod patterns;

pub use heuristic::HeuristicDetector;
pub use patterns::Vocabulary;

use crate::anonymization::rules::{
    AddressLevel, AnonymizationMethod, AnonymizationRule, DateGranularity, FakeKind, FakeParams,
    Generalization, HashParams, MaskParams,
};
use crate::domain::{DataRecord, SchemaField};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Kind of personal data a field holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PiiType {
    Name,
    Email,
    Phone,
    Address,
    Ssn,
    DateOfBirth,
    Id,
    CreditCard,
}

impl PiiType {
    /// Every type, in tie-break order
    pub const ALL: [PiiType; 8] = [
        Self::Name,
        Self::Email,
        Self::Phone,
        Self::Address,
        Self::Ssn,
        Self::DateOfBirth,
        Self::Id,
        Self::CreditCard,
    ];

    /// Wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Email => "email",
            Self::Phone => "phone",
            Self::Address => "address",
            Self::Ssn => "ssn",
            Self::DateOfBirth => "date_of_birth",
            Self::Id => "id",
            Self::CreditCard => "credit_card",
        }
    }
}

impl fmt::Display for PiiType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PiiType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "name" => Ok(Self::Name),
            "email" => Ok(Self::Email),
            "phone" => Ok(Self::Phone),
            "address" => Ok(Self::Address),
            "ssn" => Ok(Self::Ssn),
            "date_of_birth" | "dob" => Ok(Self::DateOfBirth),
            "id" => Ok(Self::Id),
            "credit_card" | "card" => Ok(Self::CreditCard),
            other => Err(format!("unknown PII type: {other}")),
        }
    }
}

/// A field flagged as personal data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedField {
    /// Field name
    pub field: String,
    /// Highest-scoring PII type
    #[serde(rename = "type")]
    pub pii_type: PiiType,
    /// Combined confidence in `[0, 1]`
    pub confidence: f64,
    /// Up to three example values
    pub samples: Vec<String>,
}

/// Output of a detection pass
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DetectionResult {
    /// Flagged fields, in schema order
    pub detected_fields: Vec<DetectedField>,
    /// One suggested rule per flagged field
    pub suggested_rules: Vec<AnonymizationRule>,
}

impl DetectionResult {
    /// Whether a field was flagged
    pub fn is_detected(&self, field: &str) -> bool {
        self.detected_fields.iter().any(|d| d.field == field)
    }

    /// Detected type of a field
    pub fn type_of(&self, field: &str) -> Option<PiiType> {
        self.detected_fields
            .iter()
            .find(|d| d.field == field)
            .map(|d| d.pii_type)
    }

    /// Format the result for console output
    pub fn format_console(&self) -> String {
        let mut output = String::new();

        output.push('\n');
        output.push_str("═══════════════════════════════════════════════════════════════\n");
        output.push_str("                     PII DETECTION REPORT                      \n");
        output.push_str("═══════════════════════════════════════════════════════════════\n");
        output.push('\n');

        if self.detected_fields.is_empty() {
            output.push_str("  No personal data detected\n\n");
            return output;
        }

        output.push_str("🔍 DETECTED FIELDS\n");
        output.push_str("───────────────────────────────────────────────────────────────\n");
        for detected in &self.detected_fields {
            output.push_str(&format!(
                "  {:24} {:14} {:>6.1}%\n",
                detected.field,
                detected.pii_type.as_str(),
                detected.confidence * 100.0
            ));
            for sample in &detected.samples {
                output.push_str(&format!("      e.g. \"{}\"\n", truncate_sample(sample)));
            }
        }
        output.push('\n');

        if !self.suggested_rules.is_empty() {
            output.push_str("📝 SUGGESTED RULES\n");
            output.push_str("───────────────────────────────────────────────────────────────\n");
            for rule in &self.suggested_rules {
                output.push_str(&format!(
                    "  {:24} {}\n",
                    rule.field.to_string(),
                    rule.method.kind()
                ));
            }
            output.push('\n');
        }

        output.push_str("═══════════════════════════════════════════════════════════════\n");
        output
    }
}

fn truncate_sample(sample: &str) -> String {
    if sample.chars().count() > 40 {
        let head: String = sample.chars().take(37).collect();
        format!("{head}...")
    } else {
        sample.to_string()
    }
}

/// Default anonymization method per PII type, used for suggested rules
#[derive(Debug, Clone)]
pub struct RuleTable {
    methods: BTreeMap<PiiType, AnonymizationMethod>,
}

impl Default for RuleTable {
    fn default() -> Self {
        let methods = BTreeMap::from([
            (PiiType::Email, AnonymizationMethod::Mask(MaskParams::partial())),
            (PiiType::Phone, AnonymizationMethod::Mask(MaskParams::keep_last(4))),
            (PiiType::Ssn, AnonymizationMethod::Hash(HashParams::default())),
            (
                PiiType::Name,
                AnonymizationMethod::Fake(FakeParams::of(FakeKind::Name)),
            ),
            (
                PiiType::DateOfBirth,
                AnonymizationMethod::Generalize(Generalization::DateTruncate {
                    granularity: DateGranularity::Year,
                }),
            ),
            (PiiType::Id, AnonymizationMethod::Hash(HashParams::default())),
            (
                PiiType::CreditCard,
                AnonymizationMethod::Mask(MaskParams::keep_last(4)),
            ),
            (
                PiiType::Address,
                AnonymizationMethod::Generalize(Generalization::AddressTruncate {
                    level: AddressLevel::City,
                }),
            ),
        ]);
        Self { methods }
    }
}

impl RuleTable {
    /// Override the method for one type
    pub fn with(mut self, pii_type: PiiType, method: AnonymizationMethod) -> Self {
        self.methods.insert(pii_type, method);
        self
    }

    /// Method configured for a type
    pub fn method_for(&self, pii_type: PiiType) -> Option<&AnonymizationMethod> {
        self.methods.get(&pii_type)
    }

    /// Suggested rule for a detected field
    pub fn rule_for(&self, detected: &DetectedField) -> Option<AnonymizationRule> {
        self.method_for(detected.pii_type)
            .map(|method| AnonymizationRule::new(detected.field.clone(), method.clone()))
    }
}

/// Trait for PII detection implementations
pub trait PiiDetector: Send + Sync {
    /// Scan a dataset and flag personal-data fields
    ///
    /// Only fields named in `schema` are scored; empty `data` or an empty
    /// `schema` yields an empty result. [`infer_schema`](crate::domain::infer_schema)
    /// builds a schema for data that arrives without one.
    fn detect(&self, data: &[DataRecord], schema: &[SchemaField]) -> DetectionResult;

    /// Minimum confidence a field must exceed to be reported
    fn confidence_threshold(&self) -> f64;
}

/// Detect personal data with the default heuristic detector
pub fn detect_pii(data: &[DataRecord], schema: &[SchemaField]) -> DetectionResult {
    HeuristicDetector::default().detect(data, schema)
}
