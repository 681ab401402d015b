//! Anonymization rules
//!
//! A rule pairs a [`FieldSelector`] with an [`AnonymizationMethod`]. Methods are
//! a closed sum type, so adding one is a compile-time change at every dispatch
//! site rather than a fall-through default.
//!
//! On the wire a rule looks like:
//!
//! ```json
//! { "field": "email", "method": "mask", "parameters": { "partial": true } }
//! ```
//!
//! `parameters` may be omitted; every method has usable defaults.

use crate::domain::{Result, SieveError};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Literal used for the wildcard selector
pub const WILDCARD: &str = "*";

/// Which field(s) a rule targets
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FieldSelector {
    /// One named field
    Field(String),
    /// Every field without its own rule
    Wildcard,
}

impl From<String> for FieldSelector {
    fn from(value: String) -> Self {
        if value == WILDCARD {
            Self::Wildcard
        } else {
            Self::Field(value)
        }
    }
}

impl From<&str> for FieldSelector {
    fn from(value: &str) -> Self {
        Self::from(value.to_string())
    }
}

impl From<FieldSelector> for String {
    fn from(value: FieldSelector) -> Self {
        match value {
            FieldSelector::Field(name) => name,
            FieldSelector::Wildcard => WILDCARD.to_string(),
        }
    }
}

impl fmt::Display for FieldSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Field(name) => f.write_str(name),
            Self::Wildcard => f.write_str(WILDCARD),
        }
    }
}

/// Parameters for [`AnonymizationMethod::Mask`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaskParams {
    /// Replacement character
    #[serde(default = "default_mask_char")]
    pub mask_char: char,
    /// Keep `keep_start`/`keep_end` characters visible
    #[serde(default)]
    pub partial: bool,
    /// Leading characters left visible in partial mode
    #[serde(default = "default_keep_start")]
    pub keep_start: usize,
    /// Trailing characters left visible in partial mode
    #[serde(default)]
    pub keep_end: usize,
}

fn default_mask_char() -> char {
    '*'
}

fn default_keep_start() -> usize {
    1
}

impl Default for MaskParams {
    fn default() -> Self {
        Self {
            mask_char: default_mask_char(),
            partial: false,
            keep_start: default_keep_start(),
            keep_end: 0,
        }
    }
}

impl MaskParams {
    /// Mask every character
    pub fn full() -> Self {
        Self::default()
    }

    /// Keep the first character (and an email's domain) visible
    pub fn partial() -> Self {
        Self {
            partial: true,
            ..Self::default()
        }
    }

    /// Keep only the last `n` characters visible
    pub fn keep_last(n: usize) -> Self {
        Self {
            partial: true,
            keep_start: 0,
            keep_end: n,
            ..Self::default()
        }
    }
}

/// Parameters for [`AnonymizationMethod::Hash`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HashParams {
    /// Hex characters kept from the digest (clamped to 8..=64)
    #[serde(default = "default_hash_length")]
    pub length: usize,
}

fn default_hash_length() -> usize {
    16
}

impl Default for HashParams {
    fn default() -> Self {
        Self {
            length: default_hash_length(),
        }
    }
}

/// Kind of synthetic value produced by [`AnonymizationMethod::Fake`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FakeKind {
    Name,
    FirstName,
    LastName,
    Email,
    Phone,
    Address,
    City,
    Company,
    Url,
    Date,
    Number,
    Ssn,
    CreditCard,
    Id,
    Text,
}

/// Parameters for [`AnonymizationMethod::Fake`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FakeParams {
    /// Kind to generate; inferred from field name and value when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<FakeKind>,
}

impl FakeParams {
    /// Generate a fixed kind
    pub fn of(kind: FakeKind) -> Self {
        Self { kind: Some(kind) }
    }
}

/// Granularity for date generalization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateGranularity {
    /// `YYYY-MM`
    Month,
    /// `YYYY`
    Year,
}

/// Granularity for address generalization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AddressLevel {
    /// Last two comma-separated parts, without postcodes
    City,
    /// Last comma-separated part, without postcodes
    Region,
}

/// Parameters for [`AnonymizationMethod::Generalize`]
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum Generalization {
    /// Pick a strategy from the value's shape
    #[default]
    Auto,
    /// Bucket numbers into ranges of `bucket_size`
    NumericRange {
        #[serde(default = "default_bucket_size")]
        bucket_size: f64,
    },
    /// Truncate dates
    DateTruncate { granularity: DateGranularity },
    /// Drop street-level address parts
    AddressTruncate { level: AddressLevel },
    /// Keep the first `keep` characters and mark the rest with `*`
    Prefix { keep: usize },
}

fn default_bucket_size() -> f64 {
    10.0
}

/// How a field is anonymized
#[derive(Debug, Clone, PartialEq)]
pub enum AnonymizationMethod {
    /// Replace characters with a mask character
    Mask(MaskParams),
    /// Replace with a seeded one-way digest
    Hash(HashParams),
    /// Replace with a seeded synthetic value of the same kind
    Fake(FakeParams),
    /// Replace with a coarser category
    Generalize(Generalization),
    /// Set to null
    Remove,
    /// Permute the column across rows
    ///
    /// Shuffle runs after every per-row method. Shuffling one field while
    /// generalizing a field derived from the same real-world entity (city and
    /// zipcode, say) can leave rows internally inconsistent; keeping such
    /// fields coherent is the caller's responsibility.
    Shuffle,
}

/// Fieldless tag of an [`AnonymizationMethod`], used in reports and on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MethodKind {
    Mask,
    Hash,
    Fake,
    Generalize,
    Remove,
    Shuffle,
}

impl fmt::Display for MethodKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Mask => "mask",
            Self::Hash => "hash",
            Self::Fake => "fake",
            Self::Generalize => "generalize",
            Self::Remove => "remove",
            Self::Shuffle => "shuffle",
        };
        f.write_str(s)
    }
}

impl AnonymizationMethod {
    /// Fieldless tag
    pub fn kind(&self) -> MethodKind {
        match self {
            Self::Mask(_) => MethodKind::Mask,
            Self::Hash(_) => MethodKind::Hash,
            Self::Fake(_) => MethodKind::Fake,
            Self::Generalize(_) => MethodKind::Generalize,
            Self::Remove => MethodKind::Remove,
            Self::Shuffle => MethodKind::Shuffle,
        }
    }

    /// Whether the method needs the whole column rather than one value
    pub fn is_column_wide(&self) -> bool {
        matches!(self, Self::Shuffle)
    }

    fn parameters(&self) -> Value {
        let params = match self {
            Self::Mask(p) => serde_json::to_value(p),
            Self::Hash(p) => serde_json::to_value(p),
            Self::Fake(p) => serde_json::to_value(p),
            Self::Generalize(p) => serde_json::to_value(p),
            Self::Remove | Self::Shuffle => return Value::Null,
        };
        params.unwrap_or_default()
    }

    fn from_parts(kind: MethodKind, parameters: Value) -> std::result::Result<Self, String> {
        Ok(match kind {
            MethodKind::Mask => Self::Mask(decode_params(kind, parameters)?),
            MethodKind::Hash => Self::Hash(decode_params(kind, parameters)?),
            MethodKind::Fake => Self::Fake(decode_params(kind, parameters)?),
            MethodKind::Generalize => Self::Generalize(decode_params(kind, parameters)?),
            MethodKind::Remove => Self::Remove,
            MethodKind::Shuffle => Self::Shuffle,
        })
    }
}

/// Decode method parameters; null or `{}` yields the defaults
pub(crate) fn decode_params<T>(
    kind: impl fmt::Display,
    parameters: Value,
) -> std::result::Result<T, String>
where
    T: Default + serde::de::DeserializeOwned,
{
    let is_empty = match &parameters {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        _ => false,
    };
    if is_empty {
        return Ok(T::default());
    }
    serde_json::from_value(parameters).map_err(|e| format!("invalid parameters for {kind}: {e}"))
}

/// Wire shape of a rule
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawRule {
    field: FieldSelector,
    method: MethodKind,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    parameters: Value,
}

/// One anonymization rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawRule", into = "RawRule")]
pub struct AnonymizationRule {
    /// Target field or wildcard
    pub field: FieldSelector,
    /// Method applied to the field
    pub method: AnonymizationMethod,
}

impl TryFrom<RawRule> for AnonymizationRule {
    type Error = String;

    fn try_from(raw: RawRule) -> std::result::Result<Self, Self::Error> {
        Ok(Self {
            field: raw.field,
            method: AnonymizationMethod::from_parts(raw.method, raw.parameters)?,
        })
    }
}

impl From<AnonymizationRule> for RawRule {
    fn from(rule: AnonymizationRule) -> Self {
        Self {
            parameters: rule.method.parameters(),
            method: rule.method.kind(),
            field: rule.field,
        }
    }
}

impl AnonymizationRule {
    /// Create a rule; `"*"` selects the wildcard
    pub fn new(field: impl Into<String>, method: AnonymizationMethod) -> Self {
        Self {
            field: FieldSelector::from(field.into()),
            method,
        }
    }

    /// Create a wildcard rule
    pub fn wildcard(method: AnonymizationMethod) -> Self {
        Self {
            field: FieldSelector::Wildcard,
            method,
        }
    }

    /// Concrete field name, if any
    pub fn field_name(&self) -> Option<&str> {
        match &self.field {
            FieldSelector::Field(name) => Some(name),
            FieldSelector::Wildcard => None,
        }
    }
}

/// A validated, lookup-ready set of rules
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    by_field: BTreeMap<String, AnonymizationMethod>,
    wildcard: Option<AnonymizationMethod>,
}

impl RuleSet {
    /// Index rules by field, rejecting duplicates
    ///
    /// Two rules for the same concrete field, or two wildcard rules, are a
    /// validation error.
    pub fn compile(rules: &[AnonymizationRule]) -> Result<Self> {
        let mut set = Self::default();

        for rule in rules {
            match &rule.field {
                FieldSelector::Field(name) => {
                    if set
                        .by_field
                        .insert(name.clone(), rule.method.clone())
                        .is_some()
                    {
                        return Err(SieveError::DuplicateRule(name.clone()));
                    }
                }
                FieldSelector::Wildcard => {
                    if set.wildcard.replace(rule.method.clone()).is_some() {
                        return Err(SieveError::DuplicateRule(WILDCARD.to_string()));
                    }
                }
            }
        }

        Ok(set)
    }

    /// Reject concrete rules that name a field outside `available`
    pub fn check_fields(&self, available: &[String]) -> Result<()> {
        for (field, method) in &self.by_field {
            if !available.iter().any(|f| f == field) {
                return Err(SieveError::unknown_field(
                    format!("{} rule", method.kind()),
                    field,
                ));
            }
        }
        Ok(())
    }

    /// Resolve the method for a field: exact match, else wildcard, else none
    pub fn resolve(&self, field: &str) -> Option<&AnonymizationMethod> {
        self.by_field.get(field).or(self.wildcard.as_ref())
    }

    /// Whether any rule exists
    pub fn is_empty(&self) -> bool {
        self.by_field.is_empty() && self.wildcard.is_none()
    }

    /// Whether a concrete rule exists for `field`
    pub fn covers(&self, field: &str) -> bool {
        self.by_field.contains_key(field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_rule_wire_round_trip_with_parameters() {
        let rule: AnonymizationRule = serde_json::from_value(json!({
            "field": "email",
            "method": "mask",
            "parameters": {"partial": true}
        }))
        .unwrap();

        assert_eq!(rule.field, FieldSelector::Field("email".into()));
        assert_eq!(rule.method, AnonymizationMethod::Mask(MaskParams::partial()));

        let back = serde_json::to_value(&rule).unwrap();
        assert_eq!(back["method"], "mask");
        assert_eq!(back["parameters"]["partial"], true);
    }

    #[test]
    fn test_rule_without_parameters_uses_defaults() {
        let rule: AnonymizationRule =
            serde_json::from_value(json!({"field": "*", "method": "hash"})).unwrap();
        assert_eq!(rule.field, FieldSelector::Wildcard);
        assert_eq!(rule.method, AnonymizationMethod::Hash(HashParams::default()));

        let rule: AnonymizationRule =
            serde_json::from_value(json!({"field": "dob", "method": "generalize"})).unwrap();
        assert_eq!(rule.method, AnonymizationMethod::Generalize(Generalization::Auto));
    }

    #[test]
    fn test_generalize_parameters_are_tagged() {
        let rule: AnonymizationRule = serde_json::from_value(json!({
            "field": "age",
            "method": "generalize",
            "parameters": {"strategy": "numeric_range", "bucket_size": 5}
        }))
        .unwrap();
        assert_eq!(
            rule.method,
            AnonymizationMethod::Generalize(Generalization::NumericRange { bucket_size: 5.0 })
        );
    }

    #[test]
    fn test_unknown_method_is_rejected() {
        let result: std::result::Result<AnonymizationRule, _> =
            serde_json::from_value(json!({"field": "a", "method": "encrypt"}));
        assert!(result.is_err());
    }

    #[test]
    fn test_rule_set_rejects_duplicates() {
        let rules = vec![
            AnonymizationRule::new("email", AnonymizationMethod::Remove),
            AnonymizationRule::new("email", AnonymizationMethod::Shuffle),
        ];
        let err = RuleSet::compile(&rules).unwrap_err();
        assert!(matches!(err, SieveError::DuplicateRule(f) if f == "email"));

        let rules = vec![
            AnonymizationRule::wildcard(AnonymizationMethod::Remove),
            AnonymizationRule::wildcard(AnonymizationMethod::Shuffle),
        ];
        assert!(RuleSet::compile(&rules).is_err());
    }

    #[test]
    fn test_rule_set_resolution_order() {
        let rules = vec![
            AnonymizationRule::wildcard(AnonymizationMethod::Remove),
            AnonymizationRule::new("id", AnonymizationMethod::Hash(HashParams::default())),
        ];
        let set = RuleSet::compile(&rules).unwrap();

        assert_eq!(set.resolve("id").unwrap().kind(), MethodKind::Hash);
        assert_eq!(set.resolve("anything").unwrap().kind(), MethodKind::Remove);

        let set = RuleSet::compile(&rules[1..]).unwrap();
        assert!(set.resolve("anything").is_none());
    }

    #[test]
    fn test_check_fields_reports_unknown_field() {
        let rules = vec![AnonymizationRule::new("ssn", AnonymizationMethod::Remove)];
        let set = RuleSet::compile(&rules).unwrap();
        let err = set.check_fields(&["email".to_string()]).unwrap_err();
        assert!(matches!(err, SieveError::UnknownField { field, .. } if field == "ssn"));
    }
}
