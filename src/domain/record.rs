//! Dataset records and scalar value helpers
//!
//! A [`DataRecord`] is one row of a tabular dataset: an ordered map from field
//! name to a JSON scalar. serde_json is built with `preserve_order`, so key
//! insertion order survives every transformation and reaches the exporter
//! unchanged.
//!
//! Dates are carried as ISO-8601 strings. [`parse_date`] accepts the handful
//! of layouts that show up in uploaded spreadsheets and is shared by the
//! detector, the generalizer and the `convert`/`format` pipeline rules.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::{Number, Value};

/// One row of a dataset
pub type DataRecord = serde_json::Map<String, Value>;

const DATE_LAYOUTS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d.%m.%Y", "%Y%m%d"];

const DATETIME_LAYOUTS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// A date or timestamp recovered from a string value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedDate {
    /// Parsed instant (midnight when the source had no time component)
    pub datetime: NaiveDateTime,
    /// Whether the source carried a time component
    pub has_time: bool,
}

impl ParsedDate {
    /// Calendar date part
    pub fn date(&self) -> NaiveDate {
        self.datetime.date()
    }

    /// Canonical ISO-8601 rendering (`YYYY-MM-DD` or `YYYY-MM-DDTHH:MM:SS`)
    pub fn to_iso(&self) -> String {
        if self.has_time {
            self.datetime.format("%Y-%m-%dT%H:%M:%S").to_string()
        } else {
            self.datetime.format("%Y-%m-%d").to_string()
        }
    }
}

/// Collect every field name present in `data`, in first-appearance order
pub fn field_names(data: &[DataRecord]) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for record in data {
        for key in record.keys() {
            if !names.iter().any(|n| n == key) {
                names.push(key.clone());
            }
        }
    }
    names
}

/// Parse a date or timestamp from a string
///
/// Compact `YYYYMMDD` is only accepted for exactly eight digits so that
/// ordinary integers are not mistaken for dates.
pub fn parse_date(text: &str) -> Option<ParsedDate> {
    let text = text.trim();
    if text.len() < 6 {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(ParsedDate {
            datetime: dt.naive_utc(),
            has_time: true,
        });
    }

    for layout in DATETIME_LAYOUTS {
        if let Ok(datetime) = NaiveDateTime::parse_from_str(text, layout) {
            return Some(ParsedDate {
                datetime,
                has_time: true,
            });
        }
    }

    for layout in DATE_LAYOUTS {
        if *layout == "%Y%m%d" && (text.len() != 8 || !text.bytes().all(|b| b.is_ascii_digit())) {
            continue;
        }
        if let Ok(date) = NaiveDate::parse_from_str(text, layout) {
            return Some(ParsedDate {
                datetime: date.and_hms_opt(0, 0, 0)?,
                has_time: false,
            });
        }
    }

    None
}

/// Interpret a value as a finite number
///
/// Numeric strings are accepted after trimming; `NaN`/`inf` spellings are not.
pub fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().filter(|f| f.is_finite()),
        Value::String(s) => parse_number(s),
        _ => None,
    }
}

/// Parse a finite number from text
pub fn parse_number(text: &str) -> Option<f64> {
    let text = text.trim();
    if !text.bytes().any(|b| b.is_ascii_digit()) {
        return None;
    }
    text.parse::<f64>().ok().filter(|f| f.is_finite())
}

/// Build a JSON number, preferring an integer representation for whole values
///
/// `5.0` becomes `5` so that a converted `"5"` compares equal to `json!(5)`.
pub fn number_value(n: f64) -> Value {
    const MAX_SAFE: f64 = 9_007_199_254_740_992.0;
    if n.is_finite() && n.fract() == 0.0 && n.abs() < MAX_SAFE {
        Value::from(n as i64)
    } else {
        Number::from_f64(n).map(Value::Number).unwrap_or(Value::Null)
    }
}

/// Render a scalar as display text; `None` for null
pub fn display_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        other => Some(other.to_string()),
    }
}

/// Parse a boolean from its common spreadsheet spellings
pub fn parse_bool(text: &str) -> Option<bool> {
    match text.trim().to_lowercase().as_str() {
        "true" | "yes" | "y" | "t" => Some(true),
        "false" | "no" | "n" | "f" => Some(false),
        _ => None,
    }
}
