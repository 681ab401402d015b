//! Generalization strategies
//!
//! Each strategy replaces a value with a coarser category. A value the
//! strategy cannot handle is reported as an error and the caller nulls it;
//! passing the original through would leak it.

use crate::anonymization::rules::{AddressLevel, DateGranularity, Generalization};
use crate::domain::{as_number, display_text, number_value, parse_date};
use serde_json::Value;
use url::Url;

/// Generalize a non-null value
pub fn generalize(value: &Value, strategy: &Generalization) -> Result<Value, String> {
    match strategy {
        Generalization::Auto => generalize_auto(value),
        Generalization::NumericRange { bucket_size } => {
            let n = as_number(value).ok_or("value is not numeric")?;
            numeric_range(n, *bucket_size).map(Value::String)
        }
        Generalization::DateTruncate { granularity } => {
            let text = value.as_str().ok_or("value is not a date string")?;
            date_truncate(text, *granularity).map(Value::String)
        }
        Generalization::AddressTruncate { level } => {
            let text = value.as_str().ok_or("value is not an address string")?;
            address_truncate(text, *level).map(Value::String)
        }
        Generalization::Prefix { keep } => {
            let text = display_text(value).ok_or("value is null")?;
            Ok(Value::String(prefix(&text, *keep)))
        }
    }
}

fn generalize_auto(value: &Value) -> Result<Value, String> {
    match value {
        Value::Number(_) => {
            let n = as_number(value).ok_or("value is not a finite number")?;
            numeric_range(n, 10.0).map(Value::String)
        }
        Value::String(text) => {
            if parse_date(text).is_some() {
                return date_truncate(text, DateGranularity::Month).map(Value::String);
            }
            if let Some(origin) = url_origin(text) {
                return Ok(Value::String(origin));
            }
            if text.contains(',') {
                return address_truncate(text, AddressLevel::City).map(Value::String);
            }
            Ok(Value::String(prefix(text, 1)))
        }
        _ => Err("no generalization applies to this value".to_string()),
    }
}

/// Bucket a number; `23` with size `10` becomes `"20-29"`
fn numeric_range(n: f64, bucket_size: f64) -> Result<String, String> {
    if !bucket_size.is_finite() || bucket_size <= 0.0 {
        return Err(format!("bucket_size must be positive, got {bucket_size}"));
    }
    let lower = (n / bucket_size).floor() * bucket_size;
    let upper = lower + bucket_size;

    if bucket_size.fract() == 0.0 {
        Ok(format!("{}-{}", number_value(lower), number_value(upper - 1.0)))
    } else {
        Ok(format!("{lower:.2}-{upper:.2}"))
    }
}

fn date_truncate(text: &str, granularity: DateGranularity) -> Result<String, String> {
    let parsed = parse_date(text).ok_or("value is not a recognised date")?;
    let layout = match granularity {
        DateGranularity::Month => "%Y-%m",
        DateGranularity::Year => "%Y",
    };
    Ok(parsed.date().format(layout).to_string())
}

fn address_truncate(text: &str, level: AddressLevel) -> Result<String, String> {
    let parts: Vec<&str> = text
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect();
    if parts.len() < 2 {
        return Err("address has no locality part".to_string());
    }

    // The first part is the street line and is never kept
    let keep = match level {
        AddressLevel::City => &parts[parts.len().saturating_sub(2).max(1)..],
        AddressLevel::Region => &parts[parts.len() - 1..],
    };

    let kept: Vec<String> = keep
        .iter()
        .map(|part| strip_postcode(part))
        .filter(|part| !part.is_empty())
        .collect();

    if kept.is_empty() {
        return Err("address has no locality part".to_string());
    }
    Ok(kept.join(", "))
}

fn strip_postcode(part: &str) -> String {
    part.split_whitespace()
        .filter(|word| !word.chars().any(|c| c.is_ascii_digit()))
        .collect::<Vec<_>>()
        .join(" ")
}

fn prefix(text: &str, keep: usize) -> String {
    let head: String = text.chars().take(keep).collect();
    format!("{head}*")
}

fn url_origin(text: &str) -> Option<String> {
    let url = Url::parse(text).ok()?;
    if !matches!(url.scheme(), "http" | "https") {
        return None;
    }
    let host = url.host_str()?;
    Some(format!("{}://{host}", url.scheme()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use test_case::test_case;

    #[test_case(json!(23), 10.0, "20-29" ; "integer bucket")]
    #[test_case(json!(30), 10.0, "30-39" ; "lower bound")]
    #[test_case(json!("47"), 5.0, "45-49" ; "numeric string")]
    #[test_case(json!(-3), 10.0, "-10--1" ; "negative")]
    #[test_case(json!(1.3), 0.5, "1.00-1.50" ; "fractional bucket")]
    fn test_numeric_range(value: Value, bucket_size: f64, expected: &str) {
        let strategy = Generalization::NumericRange { bucket_size };
        assert_eq!(generalize(&value, &strategy).unwrap(), json!(expected));
    }

    #[test]
    fn test_numeric_range_rejects_bad_input() {
        let strategy = Generalization::NumericRange { bucket_size: 10.0 };
        assert!(generalize(&json!("abc"), &strategy).is_err());
        let strategy = Generalization::NumericRange { bucket_size: 0.0 };
        assert!(generalize(&json!(5), &strategy).is_err());
    }

    #[test]
    fn test_date_truncate() {
        let year = Generalization::DateTruncate {
            granularity: DateGranularity::Year,
        };
        let month = Generalization::DateTruncate {
            granularity: DateGranularity::Month,
        };
        assert_eq!(generalize(&json!("1990-04-12"), &year).unwrap(), json!("1990"));
        assert_eq!(generalize(&json!("04/12/1990"), &month).unwrap(), json!("1990-04"));
        assert!(generalize(&json!("not a date"), &year).is_err());
    }

    #[test]
    fn test_address_truncate() {
        let city = Generalization::AddressTruncate {
            level: AddressLevel::City,
        };
        let region = Generalization::AddressTruncate {
            level: AddressLevel::Region,
        };
        let address = json!("12 Main St, Springfield, IL 62701");
        assert_eq!(generalize(&address, &city).unwrap(), json!("Springfield, IL"));
        assert_eq!(generalize(&address, &region).unwrap(), json!("IL"));

        let short = json!("12 Main St, Springfield");
        assert_eq!(generalize(&short, &city).unwrap(), json!("Springfield"));
        assert!(generalize(&json!("12 Main St"), &city).is_err());
    }

    #[test]
    fn test_auto_picks_strategy_from_shape() {
        let auto = Generalization::Auto;
        assert_eq!(generalize(&json!(37), &auto).unwrap(), json!("30-39"));
        assert_eq!(generalize(&json!("2021-07-04"), &auto).unwrap(), json!("2021-07"));
        assert_eq!(
            generalize(&json!("https://example.com/users/42?x=1"), &auto).unwrap(),
            json!("https://example.com")
        );
        assert_eq!(generalize(&json!("Bob"), &auto).unwrap(), json!("B*"));
        assert!(generalize(&json!(true), &auto).is_err());
    }

    #[test]
    fn test_prefix() {
        let strategy = Generalization::Prefix { keep: 3 };
        assert_eq!(generalize(&json!("SW1A 1AA"), &strategy).unwrap(), json!("SW1*"));
    }
}
