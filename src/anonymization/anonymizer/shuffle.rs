//! Column shuffling

use super::hash::column_rng;
use rand::seq::SliceRandom;
use serde_json::Value;

/// Permute a column in place with a Fisher-Yates pass keyed on (seed, field)
///
/// The multiset of values is unchanged; only their row positions move.
pub fn shuffle_column(column: &mut [Value], seed: &str, field: &str) {
    let mut rng = column_rng(seed, field);
    column.shuffle(&mut rng);
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sorted(values: &[Value]) -> Vec<String> {
        let mut out: Vec<String> = values.iter().map(|v| v.to_string()).collect();
        out.sort();
        out
    }

    #[test]
    fn test_shuffle_preserves_multiset() {
        let original: Vec<Value> = (0..50).map(|i| json!(i % 7)).collect();
        let mut column = original.clone();
        shuffle_column(&mut column, "seed", "city");
        assert_eq!(sorted(&column), sorted(&original));
        assert_ne!(column, original);
    }

    #[test]
    fn test_shuffle_is_deterministic() {
        let original: Vec<Value> = (0..20).map(|i| json!(format!("v{i}"))).collect();
        let mut a = original.clone();
        let mut b = original.clone();
        shuffle_column(&mut a, "seed", "city");
        shuffle_column(&mut b, "seed", "city");
        assert_eq!(a, b);

        let mut c = original.clone();
        shuffle_column(&mut c, "seed", "zip");
        assert_ne!(a, c);
    }
}
