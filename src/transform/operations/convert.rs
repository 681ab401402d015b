//! Convert operation

use crate::domain::{as_number, display_text, number_value, parse_bool, parse_date, FieldType};
use crate::transform::rules::TargetType;
use serde_json::Value;

/// Cast a non-null value; `Err` carries the row error message
pub fn convert_value(value: &Value, to_type: TargetType) -> Result<Value, String> {
    match to_type {
        TargetType::Number => to_number(value),
        TargetType::Integer => to_integer(value),
        TargetType::Boolean => to_boolean(value),
        TargetType::Date => to_date(value),
        TargetType::Text => display_text(value)
            .map(Value::String)
            .ok_or_else(|| "value is null".to_string()),
    }
}

/// Schema type a conversion produces
pub fn converted_field_type(to_type: TargetType) -> FieldType {
    match to_type {
        TargetType::Number | TargetType::Integer => FieldType::Number,
        TargetType::Boolean => FieldType::Boolean,
        TargetType::Date => FieldType::Date,
        TargetType::Text => FieldType::Text,
    }
}

fn to_number(value: &Value) -> Result<Value, String> {
    match value {
        Value::Bool(b) => Ok(Value::from(u8::from(*b))),
        _ => as_number(value)
            .map(number_value)
            .ok_or_else(|| "cannot convert to number".to_string()),
    }
}

fn to_integer(value: &Value) -> Result<Value, String> {
    let converted = to_number(value).map_err(|_| "cannot convert to integer".to_string())?;
    if converted.is_i64() || converted.is_u64() {
        Ok(converted)
    } else {
        Err("value is not a whole number".to_string())
    }
}

fn to_boolean(value: &Value) -> Result<Value, String> {
    let parsed = match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => match n.as_f64() {
            Some(f) if f == 0.0 => Some(false),
            Some(f) if f == 1.0 => Some(true),
            _ => None,
        },
        Value::String(s) => parse_bool(s),
        _ => None,
    };
    parsed
        .map(Value::Bool)
        .ok_or_else(|| "cannot convert to boolean".to_string())
}

fn to_date(value: &Value) -> Result<Value, String> {
    value
        .as_str()
        .and_then(parse_date)
        .map(|parsed| Value::String(parsed.to_iso()))
        .ok_or_else(|| "cannot convert to date".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use test_case::test_case;

    #[test_case(json!("5"), TargetType::Number, json!(5) ; "integral string")]
    #[test_case(json!(" 2.5 "), TargetType::Number, json!(2.5) ; "decimal string")]
    #[test_case(json!(true), TargetType::Number, json!(1) ; "bool to number")]
    #[test_case(json!("42"), TargetType::Integer, json!(42) ; "integer")]
    #[test_case(json!("yes"), TargetType::Boolean, json!(true) ; "yes")]
    #[test_case(json!(0), TargetType::Boolean, json!(false) ; "zero")]
    #[test_case(json!("04/12/1990"), TargetType::Date, json!("1990-04-12") ; "us date")]
    #[test_case(json!(17), TargetType::Text, json!("17") ; "number to text")]
    fn test_convert_value(input: Value, to_type: TargetType, expected: Value) {
        assert_eq!(convert_value(&input, to_type).unwrap(), expected);
    }

    #[test_case(json!("abc"), TargetType::Number ; "non numeric")]
    #[test_case(json!("2.5"), TargetType::Integer ; "fractional integer")]
    #[test_case(json!("maybe"), TargetType::Boolean ; "non boolean")]
    #[test_case(json!(19900412), TargetType::Date ; "number is not a date")]
    fn test_convert_failures(input: Value, to_type: TargetType) {
        assert!(convert_value(&input, to_type).is_err());
    }

    #[test]
    fn test_converted_field_type() {
        assert_eq!(converted_field_type(TargetType::Integer), FieldType::Number);
        assert_eq!(converted_field_type(TargetType::Date), FieldType::Date);
    }
}
