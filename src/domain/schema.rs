//! Dataset schema types
//!
//! Every key that appears in a [`DataRecord`] has a matching [`SchemaField`].
//! Fields absent from a particular row are treated as `null`.

use super::record::{field_names, parse_date, DataRecord};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Semantic type tag of a field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    /// Free text
    #[default]
    Text,
    /// Integer or decimal number
    Number,
    /// ISO-8601 date or timestamp
    Date,
    /// true/false
    Boolean,
    /// Email address
    Email,
    /// Telephone number
    Phone,
    /// Postal address
    Address,
    /// Personal name
    Name,
    /// Company or organisation name
    Company,
    /// Web URL
    Url,
    /// Embedded JSON object
    Json,
    /// Embedded JSON array
    Array,
}

impl FieldType {
    /// Lowercase tag used on the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Number => "number",
            Self::Date => "date",
            Self::Boolean => "boolean",
            Self::Email => "email",
            Self::Phone => "phone",
            Self::Address => "address",
            Self::Name => "name",
            Self::Company => "company",
            Self::Url => "url",
            Self::Json => "json",
            Self::Array => "array",
        }
    }

    /// Whether values of this type are plain strings
    pub fn is_textual(&self) -> bool {
        matches!(
            self,
            Self::Text
                | Self::Email
                | Self::Phone
                | Self::Address
                | Self::Name
                | Self::Company
                | Self::Url
        )
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Declarative value constraints
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldConstraints {
    /// Value must be non-null
    #[serde(default)]
    pub required: bool,
    /// Values must be distinct across rows
    #[serde(default)]
    pub unique: bool,
    /// Lower bound (numbers) or minimum length (text)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    /// Upper bound (numbers) or maximum length (text)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    /// Regular expression the text must match
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    /// Allowed values
    #[serde(default, rename = "enum", skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<Value>>,
}

/// One column of a dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaField {
    /// Field name, unique within a schema
    pub name: String,
    /// Semantic type
    #[serde(rename = "type", default)]
    pub field_type: FieldType,
    /// Human-readable description
    #[serde(default)]
    pub description: String,
    /// Value constraints
    #[serde(default)]
    pub constraints: FieldConstraints,
}

impl SchemaField {
    /// Create a field with no description or constraints
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            description: String::new(),
            constraints: FieldConstraints::default(),
        }
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// Find a field by name
pub fn find_field<'a>(schema: &'a [SchemaField], name: &str) -> Option<&'a SchemaField> {
    schema.iter().find(|f| f.name == name)
}

/// Infer a schema from the records themselves
///
/// Fields appear in first-appearance order. The narrowest of boolean, number,
/// date, url, json, array that fits every non-null value wins; anything else
/// (or a column of nulls) is text. Personal-data types such as email are left to
/// the detector.
pub fn infer_schema(data: &[DataRecord]) -> Vec<SchemaField> {
    field_names(data)
        .into_iter()
        .map(|name| {
            let field_type = infer_type(data.iter().filter_map(|r| r.get(&name)));
            SchemaField::new(name, field_type)
        })
        .collect()
}

fn infer_type<'a>(values: impl Iterator<Item = &'a Value>) -> FieldType {
    let mut inferred: Option<FieldType> = None;

    for value in values {
        let this = match value {
            Value::Null => continue,
            Value::Bool(_) => FieldType::Boolean,
            Value::Number(_) => FieldType::Number,
            Value::Object(_) => FieldType::Json,
            Value::Array(_) => FieldType::Array,
            Value::String(s) if parse_date(s).is_some() => FieldType::Date,
            Value::String(s) if is_web_url(s) => FieldType::Url,
            Value::String(_) => FieldType::Text,
        };
        match inferred {
            None => inferred = Some(this),
            Some(prev) if prev == this => {}
            Some(_) => return FieldType::Text,
        }
    }

    inferred.unwrap_or_default()
}

fn is_web_url(text: &str) -> bool {
    url::Url::parse(text.trim())
        .map(|u| matches!(u.scheme(), "http" | "https") && u.host_str().is_some())
        .unwrap_or(false)
}
