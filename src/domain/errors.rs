//! Domain error types
//!
//! This module defines the error hierarchy for Sieve. Structural and
//! configuration problems surface here as [`SieveError`] and abort a run
//! before any output is produced. Per-value problems (a string that cannot
//! become a number, a division by zero) never become a `SieveError`; they are
//! recorded as [`RowError`](crate::protocol::RowError) entries in a report.
//!
//! All errors are domain-specific and don't expose third-party types.

use thiserror::Error;

/// Main Sieve error type
#[derive(Debug, Error)]
pub enum SieveError {
    /// A rule set or pipeline is structurally invalid
    #[error("Validation error: {0}")]
    Validation(String),

    /// A rule references a field that is not present in the current schema
    #[error("Validation error: {context} references unknown field '{field}'")]
    UnknownField {
        /// Rule or component that holds the reference
        context: String,
        /// Missing field name
        field: String,
    },

    /// More than one rule targets the same field
    #[error("Validation error: duplicate rule for field '{0}'")]
    DuplicateRule(String),

    /// A transformation rule has unsupported or malformed parameters
    #[error("Operation error in rule '{rule_id}': {message}")]
    Operation {
        /// Identifier of the failing rule
        rule_id: String,
        /// What was wrong with the rule
        message: String,
    },

    /// The run was cancelled with [`CancelPolicy::AbortNow`](crate::protocol::CancelPolicy)
    #[error("Run cancelled after {processed} units of work")]
    Cancelled {
        /// Rows (or rules) completed before the abort
        processed: usize,
    },

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),
}

impl SieveError {
    /// Shorthand for an [`SieveError::Operation`]
    pub fn operation(rule_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Operation {
            rule_id: rule_id.into(),
            message: message.into(),
        }
    }

    /// Shorthand for an [`SieveError::UnknownField`]
    pub fn unknown_field(context: impl Into<String>, field: impl Into<String>) -> Self {
        Self::UnknownField {
            context: context.into(),
            field: field.into(),
        }
    }

    /// True for the validation family (unknown field, duplicate rule, generic validation)
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::Validation(_) | Self::UnknownField { .. } | Self::DuplicateRule(_)
        )
    }
}

// Conversion from std::io::Error
impl From<std::io::Error> for SieveError {
    fn from(err: std::io::Error) -> Self {
        SieveError::Io(err.to_string())
    }
}

// Conversion from serde_json::Error
impl From<serde_json::Error> for SieveError {
    fn from(err: serde_json::Error) -> Self {
        SieveError::Serialization(err.to_string())
    }
}

// Conversion from toml parse errors
impl From<toml::de::Error> for SieveError {
    fn from(err: toml::de::Error) -> Self {
        SieveError::Configuration(format!("TOML parse error: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_field_display() {
        let err = SieveError::unknown_field("rule 'r2' (convert)", "b");
        assert_eq!(
            err.to_string(),
            "Validation error: rule 'r2' (convert) references unknown field 'b'"
        );
        assert!(err.is_validation());
    }

    #[test]
    fn test_operation_error_is_not_validation() {
        let err = SieveError::operation("r1", "ratio needs exactly two inputs");
        assert!(!err.is_validation());
        assert!(err.to_string().contains("r1"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "File not found");
        let err: SieveError = io_err.into();
        assert!(matches!(err, SieveError::Io(_)));
    }

    #[test]
    fn test_serde_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("invalid json").unwrap_err();
        let err: SieveError = json_err.into();
        assert!(matches!(err, SieveError::Serialization(_)));
    }

    #[test]
    fn test_toml_error_conversion() {
        let toml_err = toml::from_str::<toml::Value>("invalid = toml = syntax").unwrap_err();
        let err: SieveError = toml_err.into();
        assert!(matches!(err, SieveError::Configuration(_)));
        assert!(err.to_string().contains("TOML parse error"));
    }

    #[test]
    fn test_sieve_error_implements_std_error() {
        let err = SieveError::Validation("Test error".to_string());
        let _: &dyn std::error::Error = &err;
    }
}
