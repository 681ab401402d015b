//! Anonymization strategy module
//!
//! Per-value strategies (mask, hash, fake, generalize, remove) are applied by
//! [`apply_value_method`]. Shuffle needs the whole column and lives in
//! [`shuffle`]; the engine runs it after every row has been processed.

pub mod fake;
pub mod generalize;
pub mod hash;
pub mod mask;
pub mod shuffle;

pub use fake::{FakeValueGenerator, FakerGenerator};

use crate::anonymization::rules::AnonymizationMethod;
use serde_json::Value;

/// Everything a per-value strategy needs besides the value itself
pub struct FieldContext<'a> {
    /// Run seed
    pub seed: &'a str,
    /// Name of the field being anonymized
    pub field: &'a str,
    /// Keep masked output the same length as the original
    pub preserve_format: bool,
    /// Source of synthetic values
    pub generator: &'a dyn FakeValueGenerator,
}

/// Result of applying a method to one value
#[derive(Debug, Clone, PartialEq)]
pub enum ValueOutcome {
    /// Value left as is (nulls, or a column-wide method)
    Unchanged,
    /// Value replaced
    Replaced(Value),
    /// Strategy could not handle the value; the caller nulls it
    Failed(String),
}

/// Apply a per-value method
///
/// Nulls are never touched, so they are not counted as modifications.
pub fn apply_value_method(
    method: &AnonymizationMethod,
    value: &Value,
    ctx: &FieldContext<'_>,
) -> ValueOutcome {
    if value.is_null() {
        return ValueOutcome::Unchanged;
    }

    match method {
        AnonymizationMethod::Mask(params) => {
            match mask::mask_value(value, params, ctx.preserve_format) {
                Some(masked) => ValueOutcome::Replaced(masked),
                None => ValueOutcome::Unchanged,
            }
        }
        AnonymizationMethod::Hash(params) => ValueOutcome::Replaced(Value::String(
            hash::hash_value(params, ctx.seed, ctx.field, value),
        )),
        AnonymizationMethod::Fake(params) => {
            let kind = params
                .kind
                .unwrap_or_else(|| fake::infer_kind(ctx.field, value));
            let mut rng = hash::value_rng(ctx.seed, ctx.field, value);
            ValueOutcome::Replaced(ctx.generator.generate(kind, value, &mut rng))
        }
        AnonymizationMethod::Generalize(strategy) => {
            match generalize::generalize(value, strategy) {
                Ok(generalized) => ValueOutcome::Replaced(generalized),
                Err(message) => ValueOutcome::Failed(message),
            }
        }
        AnonymizationMethod::Remove => ValueOutcome::Replaced(Value::Null),
        AnonymizationMethod::Shuffle => ValueOutcome::Unchanged,
    }
}
