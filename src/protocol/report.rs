//! Per-row error entries shared by both engine reports

use serde::{Deserialize, Serialize};
use std::fmt;

/// Category of a recovered, per-value failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowErrorKind {
    /// Value could not be cast to the target type
    Conversion,
    /// Derived field could not be computed
    Calculation,
    /// Value could not be bucketed by the configured generalization
    Generalization,
    /// Value could not be normalised by a format rule
    Format,
    /// Value could not take part in an aggregate
    Aggregation,
}

impl fmt::Display for RowErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Conversion => "conversion",
            Self::Calculation => "calculation",
            Self::Generalization => "generalization",
            Self::Format => "format",
            Self::Aggregation => "aggregation",
        };
        f.write_str(s)
    }
}

/// A recovered failure on one value of one row
///
/// `row` is the index into the dataset the rule received, which after a
/// filter is not necessarily the index in the caller's original data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowError {
    /// Row index
    pub row: usize,
    /// Field name
    pub field: String,
    /// Human-readable explanation; never contains the original value
    pub message: String,
    /// Error category
    pub kind: RowErrorKind,
}

impl RowError {
    /// Create a new row error and trace it at debug level
    pub fn new(
        kind: RowErrorKind,
        row: usize,
        field: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        let error = Self {
            row,
            field: field.into(),
            message: message.into(),
            kind,
        };
        tracing::debug!(
            row = error.row,
            field = %error.field,
            kind = %error.kind,
            "Recovered row error"
        );
        error
    }
}

impl fmt::Display for RowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "row {} field '{}' ({}): {}",
            self.row, self.field, self.kind, self.message
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_error_display() {
        let err = RowError::new(RowErrorKind::Conversion, 1, "n", "not a number");
        assert_eq!(err.to_string(), "row 1 field 'n' (conversion): not a number");
    }

    #[test]
    fn test_row_error_serializes_snake_case_kind() {
        let err = RowError::new(RowErrorKind::Calculation, 0, "total", "division by zero");
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["kind"], "calculation");
        assert_eq!(json["row"], 0);
    }
}
