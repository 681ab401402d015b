//! Transformation rules
//!
//! A [`TransformRule`] is one step of a [`TransformationPipeline`]. The rule
//! type is a closed sum ([`TransformKind`]) carrying typed parameters.
//!
//! On the wire a rule looks like:
//!
//! ```json
//! {
//!   "id": "r1",
//!   "type": "convert",
//!   "source_field": "age",
//!   "parameters": { "to_type": "integer" },
//!   "enabled": true
//! }
//! ```

use serde::de::{DeserializeOwned, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Target of a `convert` rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetType {
    Number,
    Integer,
    Boolean,
    Date,
    Text,
}

impl fmt::Display for TargetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Number => "number",
            Self::Integer => "integer",
            Self::Boolean => "boolean",
            Self::Date => "date",
            Self::Text => "text",
        };
        f.write_str(s)
    }
}

/// Parameters for [`TransformKind::Convert`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConvertParams {
    /// Type to cast to
    pub to_type: TargetType,
}

/// Operation of a `calculate` rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalcOperation {
    Sum,
    Difference,
    Product,
    Ratio,
    Concat,
}

impl fmt::Display for CalcOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Sum => "sum",
            Self::Difference => "difference",
            Self::Product => "product",
            Self::Ratio => "ratio",
            Self::Concat => "concat",
        };
        f.write_str(s)
    }
}

/// Parameters for [`TransformKind::Calculate`]
///
/// Inputs are the rule's `source_field` followed by `operands`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculateParams {
    pub operation: CalcOperation,
    #[serde(default, deserialize_with = "one_or_many")]
    pub operands: Vec<String>,
    /// Joiner for `concat`; a single space when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub separator: Option<String>,
}

/// Letter case applied by a `format` rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaseStyle {
    Upper,
    Lower,
    Title,
    Sentence,
}

/// Parameters for [`TransformKind::Format`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormatParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub case: Option<CaseStyle>,
    /// Strip leading and trailing whitespace
    #[serde(default = "default_true")]
    pub trim: bool,
    /// Replace internal whitespace runs with one space
    #[serde(default)]
    pub collapse_whitespace: bool,
    /// chrono strftime pattern applied to date strings
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_format: Option<String>,
}

impl Default for FormatParams {
    fn default() -> Self {
        Self {
            case: None,
            trim: true,
            collapse_whitespace: false,
            date_format: None,
        }
    }
}

fn default_true() -> bool {
    true
}

/// Predicate operator of a `filter` rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterOperator {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
    Contains,
    StartsWith,
    EndsWith,
    IsNull,
    NotNull,
    In,
}

impl fmt::Display for FilterOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Eq => "eq",
            Self::Ne => "ne",
            Self::Gt => "gt",
            Self::Gte => "gte",
            Self::Lt => "lt",
            Self::Lte => "lte",
            Self::Contains => "contains",
            Self::StartsWith => "starts_with",
            Self::EndsWith => "ends_with",
            Self::IsNull => "is_null",
            Self::NotNull => "not_null",
            Self::In => "in",
        };
        f.write_str(s)
    }
}

/// Parameters for [`TransformKind::Filter`]
///
/// Rows for which the predicate is false are removed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterParams {
    /// Field tested; the rule's `source_field` when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    pub operator: FilterOperator,
    #[serde(default)]
    pub value: Value,
}

/// Reduction used by an `aggregate` rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregateFunction {
    Count,
    Sum,
    Avg,
    Min,
    Max,
}

impl fmt::Display for AggregateFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Count => "count",
            Self::Sum => "sum",
            Self::Avg => "avg",
            Self::Min => "min",
            Self::Max => "max",
        };
        f.write_str(s)
    }
}

/// One reduction of an `aggregate` rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Aggregation {
    pub field: String,
    pub function: AggregateFunction,
    /// Output field name; defaults to `field`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
}

/// Parameters for [`TransformKind::Aggregate`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregateParams {
    /// Grouping fields; the rule's `source_field` when empty
    #[serde(default, deserialize_with = "one_or_many")]
    pub group_by: Vec<String>,
    /// Explicit reductions
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aggregations: Vec<Aggregation>,
    /// Applied to every numeric non-group field when `aggregations` is empty
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function: Option<AggregateFunction>,
    /// Add a `count` field with the group size
    #[serde(default)]
    pub include_count: bool,
}

/// Accept `"a"` as well as `["a", "b"]`
fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match Option::<OneOrMany>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(OneOrMany::One(s)) => vec![s],
        Some(OneOrMany::Many(v)) => v,
    })
}

/// What a rule does
#[derive(Debug, Clone, PartialEq)]
pub enum TransformKind {
    /// Rename `source_field` to `target_field`
    Rename,
    /// Cast values in place
    Convert(ConvertParams),
    /// Derive `target_field` from several fields
    Calculate(CalculateParams),
    /// Normalise string representation in place
    Format(FormatParams),
    /// Drop rows failing a predicate
    Filter(FilterParams),
    /// Collapse rows into groups
    Aggregate(AggregateParams),
}

/// Fieldless tag of a [`TransformKind`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleType {
    Rename,
    Convert,
    Calculate,
    Format,
    Filter,
    Aggregate,
}

impl fmt::Display for RuleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Rename => "rename",
            Self::Convert => "convert",
            Self::Calculate => "calculate",
            Self::Format => "format",
            Self::Filter => "filter",
            Self::Aggregate => "aggregate",
        };
        f.write_str(s)
    }
}

impl TransformKind {
    /// Fieldless tag
    pub fn rule_type(&self) -> RuleType {
        match self {
            Self::Rename => RuleType::Rename,
            Self::Convert(_) => RuleType::Convert,
            Self::Calculate(_) => RuleType::Calculate,
            Self::Format(_) => RuleType::Format,
            Self::Filter(_) => RuleType::Filter,
            Self::Aggregate(_) => RuleType::Aggregate,
        }
    }

    fn parameters(&self) -> Value {
        let params = match self {
            Self::Rename => return Value::Null,
            Self::Convert(p) => serde_json::to_value(p),
            Self::Calculate(p) => serde_json::to_value(p),
            Self::Format(p) => serde_json::to_value(p),
            Self::Filter(p) => serde_json::to_value(p),
            Self::Aggregate(p) => serde_json::to_value(p),
        };
        params.unwrap_or_default()
    }

    fn from_parts(rule_type: RuleType, parameters: Value) -> Result<Self, String> {
        Ok(match rule_type {
            RuleType::Rename => Self::Rename,
            RuleType::Convert => Self::Convert(decode(rule_type, parameters)?),
            RuleType::Calculate => Self::Calculate(decode(rule_type, parameters)?),
            RuleType::Format => Self::Format(decode(rule_type, parameters)?),
            RuleType::Filter => Self::Filter(decode(rule_type, parameters)?),
            RuleType::Aggregate => Self::Aggregate(decode(rule_type, parameters)?),
        })
    }
}

/// Decode rule parameters; null is read as `{}` so optional fields default
fn decode<T: DeserializeOwned>(rule_type: RuleType, parameters: Value) -> Result<T, String> {
    let parameters = if parameters.is_null() {
        Value::Object(Default::default())
    } else {
        parameters
    };
    serde_json::from_value(parameters)
        .map_err(|e| format!("invalid parameters for {rule_type} rule: {e}"))
}

/// Wire shape of a rule
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawTransformRule {
    id: String,
    #[serde(rename = "type")]
    rule_type: RuleType,
    source_field: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    target_field: Option<String>,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    parameters: Value,
    #[serde(default = "default_true")]
    enabled: bool,
}

/// One pipeline step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawTransformRule", into = "RawTransformRule")]
pub struct TransformRule {
    /// Unique within a pipeline
    pub id: String,
    /// Field the rule reads
    pub source_field: String,
    /// Field the rule writes, for rename and calculate
    pub target_field: Option<String>,
    /// Disabled rules keep their position but are skipped
    pub enabled: bool,
    /// Rule type and parameters
    pub kind: TransformKind,
}

impl TryFrom<RawTransformRule> for TransformRule {
    type Error = String;

    fn try_from(raw: RawTransformRule) -> Result<Self, Self::Error> {
        let kind = TransformKind::from_parts(raw.rule_type, raw.parameters)
            .map_err(|e| format!("rule '{}': {e}", raw.id))?;
        Ok(Self {
            id: raw.id,
            source_field: raw.source_field,
            target_field: raw.target_field,
            enabled: raw.enabled,
            kind,
        })
    }
}

impl From<TransformRule> for RawTransformRule {
    fn from(rule: TransformRule) -> Self {
        Self {
            rule_type: rule.kind.rule_type(),
            parameters: rule.kind.parameters(),
            id: rule.id,
            source_field: rule.source_field,
            target_field: rule.target_field,
            enabled: rule.enabled,
        }
    }
}

impl TransformRule {
    /// Create an enabled rule with no target field
    pub fn new(id: impl Into<String>, source_field: impl Into<String>, kind: TransformKind) -> Self {
        Self {
            id: id.into(),
            source_field: source_field.into(),
            target_field: None,
            enabled: true,
            kind,
        }
    }

    /// Set the target field
    pub fn with_target(mut self, target_field: impl Into<String>) -> Self {
        self.target_field = Some(target_field.into());
        self
    }

    /// Toggle the rule
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Rename `from` to `to`
    pub fn rename(id: impl Into<String>, from: impl Into<String>, to: impl Into<String>) -> Self {
        Self::new(id, from, TransformKind::Rename).with_target(to)
    }

    /// Cast `field` to `to_type`
    pub fn convert(id: impl Into<String>, field: impl Into<String>, to_type: TargetType) -> Self {
        Self::new(id, field, TransformKind::Convert(ConvertParams { to_type }))
    }

    /// Rule type tag
    pub fn rule_type(&self) -> RuleType {
        self.kind.rule_type()
    }
}

/// Ordered list of rules; order is execution order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransformationPipeline {
    pub rules: Vec<TransformRule>,
    /// Keep the source key when renaming
    #[serde(default)]
    pub preserve_original: bool,
}

impl TransformationPipeline {
    /// Create a pipeline from rules
    pub fn new(rules: Vec<TransformRule>) -> Self {
        Self {
            rules,
            preserve_original: false,
        }
    }

    /// Toggle preserving renamed source keys
    pub fn with_preserve_original(mut self, preserve_original: bool) -> Self {
        self.preserve_original = preserve_original;
        self
    }
}
