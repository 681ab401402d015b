//! Calculate operation

use crate::domain::{as_number, display_text, number_value, DataRecord, FieldType};
use crate::transform::rules::CalcOperation;
use serde_json::Value;

/// Check the operand count an operation needs
pub fn check_arity(operation: CalcOperation, inputs: usize) -> Result<(), String> {
    match operation {
        CalcOperation::Ratio if inputs != 2 => Err(format!(
            "ratio needs exactly two inputs, got {inputs}"
        )),
        CalcOperation::Difference if inputs < 2 => {
            Err("difference needs at least two inputs".to_string())
        }
        _ => Ok(()),
    }
}

/// Schema type of a calculated field
pub fn calculated_field_type(operation: CalcOperation) -> FieldType {
    match operation {
        CalcOperation::Concat => FieldType::Text,
        _ => FieldType::Number,
    }
}

/// Compute the derived value for one record
///
/// `Err` carries the row error message; the caller stores `null`.
pub fn calculate(
    record: &DataRecord,
    inputs: &[String],
    operation: CalcOperation,
    separator: &str,
) -> Result<Value, String> {
    if operation == CalcOperation::Concat {
        let mut parts = Vec::with_capacity(inputs.len());
        for field in inputs {
            match record.get(field).and_then(display_text) {
                Some(text) => parts.push(text),
                None => return Err(format!("input '{field}' is missing")),
            }
        }
        return Ok(Value::String(parts.join(separator)));
    }

    let mut numbers = Vec::with_capacity(inputs.len());
    for field in inputs {
        match record.get(field) {
            None | Some(Value::Null) => return Err(format!("input '{field}' is missing")),
            Some(value) => match as_number(value) {
                Some(n) => numbers.push(n),
                None => return Err(format!("input '{field}' is not numeric")),
            },
        }
    }

    let Some((&first, rest)) = numbers.split_first() else {
        return Err("no inputs".to_string());
    };

    let result = match operation {
        CalcOperation::Sum => numbers.iter().sum::<f64>(),
        CalcOperation::Product => numbers.iter().product::<f64>(),
        CalcOperation::Difference => rest.iter().fold(first, |acc, n| acc - n),
        CalcOperation::Ratio => {
            let divisor = rest.first().copied().unwrap_or(0.0);
            if divisor == 0.0 {
                return Err("division by zero".to_string());
            }
            first / divisor
        }
        CalcOperation::Concat => return Err("concat is not numeric".to_string()),
    };

    if result.is_finite() {
        Ok(number_value(result))
    } else {
        Err("result is not a finite number".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use test_case::test_case;

    fn record() -> DataRecord {
        json!({"a": 10, "b": "4", "zero": 0, "name": "Ada", "last": "Lovelace", "none": null})
            .as_object()
            .unwrap()
            .clone()
    }

    fn inputs(fields: &[&str]) -> Vec<String> {
        fields.iter().map(|f| f.to_string()).collect()
    }

    #[test_case(CalcOperation::Sum, json!(14) ; "sum")]
    #[test_case(CalcOperation::Difference, json!(6) ; "difference")]
    #[test_case(CalcOperation::Product, json!(40) ; "product")]
    #[test_case(CalcOperation::Ratio, json!(2.5) ; "ratio")]
    fn test_numeric_operations(operation: CalcOperation, expected: Value) {
        let result = calculate(&record(), &inputs(&["a", "b"]), operation, " ").unwrap();
        assert_eq!(result, expected);
    }

    #[test]
    fn test_concat_with_separator() {
        let result = calculate(&record(), &inputs(&["name", "last"]), CalcOperation::Concat, " ");
        assert_eq!(result.unwrap(), json!("Ada Lovelace"));
    }

    #[test_case(&["a", "zero"], CalcOperation::Ratio ; "division by zero")]
    #[test_case(&["a", "none"], CalcOperation::Sum ; "null input")]
    #[test_case(&["a", "missing"], CalcOperation::Sum ; "absent input")]
    #[test_case(&["a", "name"], CalcOperation::Product ; "non numeric input")]
    fn test_failures(fields: &[&str], operation: CalcOperation) {
        assert!(calculate(&record(), &inputs(fields), operation, " ").is_err());
    }

    #[test]
    fn test_check_arity() {
        assert!(check_arity(CalcOperation::Ratio, 2).is_ok());
        assert!(check_arity(CalcOperation::Ratio, 3).is_err());
        assert!(check_arity(CalcOperation::Sum, 1).is_ok());
    }
}
