//! Privacy presets
//!
//! A preset turns a detection result into a rule list. `low` touches only
//! direct contact and financial identifiers; `high` removes or replaces
//! everything the detector flags. Rules a caller already wrote always win
//! over preset rules for the same field.

use crate::anonymization::detector::{DetectionResult, PiiType};
use crate::anonymization::rules::{
    AddressLevel, AnonymizationMethod, AnonymizationRule, DateGranularity, FakeKind, FakeParams,
    Generalization, HashParams, MaskParams,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Preset strength
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Low,
    #[default]
    Medium,
    High,
}

impl Level {
    /// One-line description shown to users
    pub fn description(&self) -> &'static str {
        match self {
            Self::Low => "Mask direct contact details and hash financial identifiers",
            Self::Medium => "Replace or coarsen every direct identifier",
            Self::High => "Remove or synthesise all personal data, keep only coarse aggregates",
        }
    }

    /// Method this level applies to a PII type, if any
    pub fn method_for(&self, pii_type: PiiType) -> Option<AnonymizationMethod> {
        use AnonymizationMethod as M;

        let hash = || M::Hash(HashParams::default());
        let dob = |granularity| M::Generalize(Generalization::DateTruncate { granularity });
        let address = |level| M::Generalize(Generalization::AddressTruncate { level });

        match (self, pii_type) {
            (Self::Low, PiiType::Email) => Some(M::Mask(MaskParams::partial())),
            (Self::Low, PiiType::Ssn) => Some(hash()),
            (Self::Low, PiiType::CreditCard) => Some(M::Mask(MaskParams::keep_last(4))),
            (Self::Low, _) => None,

            (Self::Medium, PiiType::Email) => Some(M::Mask(MaskParams::partial())),
            (Self::Medium, PiiType::Ssn) => Some(hash()),
            (Self::Medium, PiiType::CreditCard) => Some(M::Mask(MaskParams::keep_last(4))),
            (Self::Medium, PiiType::Phone) => Some(M::Mask(MaskParams::keep_last(4))),
            (Self::Medium, PiiType::Name) => Some(M::Fake(FakeParams::of(FakeKind::Name))),
            (Self::Medium, PiiType::Id) => Some(hash()),
            (Self::Medium, PiiType::Address) => Some(address(AddressLevel::City)),
            (Self::Medium, PiiType::DateOfBirth) => Some(dob(DateGranularity::Month)),

            (Self::High, PiiType::Name) => Some(M::Fake(FakeParams::of(FakeKind::Name))),
            (Self::High, PiiType::Email) => Some(M::Fake(FakeParams::of(FakeKind::Email))),
            (Self::High, PiiType::Phone) => Some(M::Mask(MaskParams::full())),
            (Self::High, PiiType::Address) => Some(address(AddressLevel::Region)),
            (Self::High, PiiType::Ssn) => Some(M::Remove),
            (Self::High, PiiType::DateOfBirth) => Some(dob(DateGranularity::Year)),
            (Self::High, PiiType::Id) => Some(hash()),
            (Self::High, PiiType::CreditCard) => Some(M::Remove),
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        };
        f.write_str(s)
    }
}

impl FromStr for Level {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            other => Err(format!(
                "Invalid privacy level '{other}'. Must be one of: low, medium, high"
            )),
        }
    }
}

/// A preset resolved against one dataset's detection result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrivacyLevel {
    /// Preset strength
    pub level: Level,
    /// One-line description
    pub description: String,
    /// Rules for every detected field the level covers, in detection order
    pub default_rules: Vec<AnonymizationRule>,
}

impl PrivacyLevel {
    /// Build the rules a level applies to the detected fields
    pub fn resolve(level: Level, detection: &DetectionResult) -> Self {
        let default_rules = detection
            .detected_fields
            .iter()
            .filter_map(|detected| {
                level
                    .method_for(detected.pii_type)
                    .map(|method| AnonymizationRule::new(detected.field.clone(), method))
            })
            .collect();

        Self {
            level,
            description: level.description().to_string(),
            default_rules,
        }
    }

    /// Merge preset rules into caller rules
    ///
    /// Caller rules come first and are never replaced; a preset rule is
    /// appended only when no caller rule names the same field.
    pub fn apply(&self, rules: &[AnonymizationRule]) -> Vec<AnonymizationRule> {
        let mut merged = rules.to_vec();
        for preset in &self.default_rules {
            if !rules.iter().any(|r| r.field == preset.field) {
                merged.push(preset.clone());
            }
        }
        merged
    }
}
