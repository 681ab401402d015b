//! Seeded digests
//!
//! Every deterministic method derives from one digest:
//! `SHA-256(seed ␟ field ␟ canonical-json(value))`. Hashing truncates it to
//! hex; faking seeds a `StdRng` with it. Equal originals under the same seed
//! and field therefore always produce equal outputs, which is what keeps
//! joins across anonymized tables intact.

use crate::anonymization::rules::HashParams;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde_json::Value;
use sha2::{Digest, Sha256};

const SEPARATOR: [u8; 1] = [0x1f];
const MIN_HASH_LENGTH: usize = 8;
const MAX_HASH_LENGTH: usize = 64;

fn digest(parts: &[&[u8]]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    for (i, part) in parts.iter().enumerate() {
        if i > 0 {
            hasher.update(SEPARATOR);
        }
        hasher.update(part);
    }
    hasher.finalize().into()
}

fn value_digest(seed: &str, field: &str, value: &Value) -> [u8; 32] {
    // Value's Display is compact JSON, so "5" and 5 hash differently
    let canonical = value.to_string();
    digest(&[seed.as_bytes(), field.as_bytes(), canonical.as_bytes()])
}

fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// Hash a value for the `hash` method
pub fn hash_value(params: &HashParams, seed: &str, field: &str, value: &Value) -> String {
    let length = params.length.clamp(MIN_HASH_LENGTH, MAX_HASH_LENGTH);
    let mut hex = to_hex(&value_digest(seed, field, value));
    hex.truncate(length);
    hex
}

/// Rng keyed on one original value, for the `fake` method
pub fn value_rng(seed: &str, field: &str, value: &Value) -> StdRng {
    StdRng::from_seed(value_digest(seed, field, value))
}

/// Rng keyed on a whole column, for the `shuffle` method
pub fn column_rng(seed: &str, field: &str) -> StdRng {
    StdRng::from_seed(digest(&[seed.as_bytes(), field.as_bytes(), b"shuffle"]))
}

/// Full SHA-256 of an original value under the run seed, for audit samples
///
/// Reports carry these instead of plaintext so a run can be audited
/// without exposing the data it anonymized.
pub fn audit_digest(seed: &str, value: &Value) -> String {
    let canonical = value.to_string();
    to_hex(&digest(&[seed.as_bytes(), b"audit", canonical.as_bytes()]))
}
