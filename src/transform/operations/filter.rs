//! Filter operation

use crate::domain::{as_number, parse_date, DataRecord};
use crate::transform::rules::{FilterOperator, FilterParams};
use serde_json::Value;
use std::cmp::Ordering;

/// A validated row predicate
#[derive(Debug, Clone)]
pub struct Predicate {
    field: String,
    operator: FilterOperator,
    value: Value,
}

impl Predicate {
    /// Check that `value` has the shape the operator needs
    pub fn compile(default_field: &str, params: &FilterParams) -> Result<Self, String> {
        let field = params
            .field
            .clone()
            .unwrap_or_else(|| default_field.to_string());
        let operator = params.operator;
        let value = params.value.clone();

        let ok = match operator {
            FilterOperator::Eq | FilterOperator::Ne => {
                !matches!(value, Value::Array(_) | Value::Object(_))
            }
            FilterOperator::Gt | FilterOperator::Gte | FilterOperator::Lt | FilterOperator::Lte => {
                matches!(value, Value::Number(_) | Value::String(_))
            }
            FilterOperator::Contains | FilterOperator::StartsWith | FilterOperator::EndsWith => {
                value.is_string()
            }
            FilterOperator::IsNull | FilterOperator::NotNull => true,
            FilterOperator::In => value.is_array(),
        };

        if !ok {
            return Err(format!(
                "operator '{operator}' cannot take value {}",
                value_kind(&value)
            ));
        }

        Ok(Self {
            field,
            operator,
            value,
        })
    }

    /// Field the predicate reads
    pub fn field(&self) -> &str {
        &self.field
    }

    /// Whether a record passes; absent fields count as null
    pub fn matches(&self, record: &DataRecord) -> bool {
        let actual = record.get(&self.field).unwrap_or(&Value::Null);
        match self.operator {
            FilterOperator::IsNull => actual.is_null(),
            FilterOperator::NotNull => !actual.is_null(),
            FilterOperator::Eq => loose_eq(actual, &self.value),
            FilterOperator::Ne => !loose_eq(actual, &self.value),
            FilterOperator::Gt => compare(actual, &self.value) == Some(Ordering::Greater),
            FilterOperator::Gte => matches!(
                compare(actual, &self.value),
                Some(Ordering::Greater | Ordering::Equal)
            ),
            FilterOperator::Lt => compare(actual, &self.value) == Some(Ordering::Less),
            FilterOperator::Lte => matches!(
                compare(actual, &self.value),
                Some(Ordering::Less | Ordering::Equal)
            ),
            FilterOperator::Contains => text_test(actual, &self.value, |a, b| a.contains(b)),
            FilterOperator::StartsWith => text_test(actual, &self.value, |a, b| a.starts_with(b)),
            FilterOperator::EndsWith => text_test(actual, &self.value, |a, b| a.ends_with(b)),
            FilterOperator::In => self
                .value
                .as_array()
                .is_some_and(|candidates| candidates.iter().any(|c| loose_eq(actual, c))),
        }
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Equality with numbers compared by value, so `"5"` equals `5`
fn loose_eq(actual: &Value, expected: &Value) -> bool {
    if actual == expected {
        return true;
    }
    match (actual, expected) {
        (Value::Number(_), Value::String(_)) | (Value::String(_), Value::Number(_)) => {
            matches!((as_number(actual), as_number(expected)), (Some(a), Some(b)) if a == b)
        }
        (Value::Number(a), Value::Number(b)) => a.as_f64() == b.as_f64(),
        _ => false,
    }
}

/// Order two values: numerically, then as dates, then as plain strings
fn compare(actual: &Value, expected: &Value) -> Option<Ordering> {
    if actual.is_null() {
        return None;
    }
    if let (Some(a), Some(b)) = (as_number(actual), as_number(expected)) {
        return a.partial_cmp(&b);
    }
    let (Value::String(a), Value::String(b)) = (actual, expected) else {
        return None;
    };
    match (parse_date(a), parse_date(b)) {
        (Some(a), Some(b)) => Some(a.datetime.cmp(&b.datetime)),
        _ => Some(a.as_str().cmp(b.as_str())),
    }
}

fn text_test(actual: &Value, expected: &Value, test: impl Fn(&str, &str) -> bool) -> bool {
    match (actual.as_str(), expected.as_str()) {
        (Some(a), Some(b)) => test(a, b),
        _ => false,
    }
}
