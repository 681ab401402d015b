//! Rename operation

use crate::domain::{DataRecord, SchemaField};

/// Rename a key, keeping its position
///
/// With `preserve_original` the source key stays and the new key is
/// inserted right after it. Returns `None` when the record lacks `from`.
pub fn rename_record(
    record: &DataRecord,
    from: &str,
    to: &str,
    preserve_original: bool,
) -> Option<DataRecord> {
    if !record.contains_key(from) {
        return None;
    }

    let mut renamed = DataRecord::with_capacity(record.len() + 1);
    for (key, value) in record {
        if key == from {
            if preserve_original {
                renamed.insert(key.clone(), value.clone());
            }
            renamed.insert(to.to_string(), value.clone());
        } else {
            renamed.insert(key.clone(), value.clone());
        }
    }
    Some(renamed)
}

/// Apply the same rename to a schema
pub fn rename_schema(
    schema: &[SchemaField],
    from: &str,
    to: &str,
    preserve_original: bool,
) -> Vec<SchemaField> {
    let mut renamed = Vec::with_capacity(schema.len() + 1);
    for field in schema {
        if field.name == from {
            if preserve_original {
                renamed.push(field.clone());
            }
            let mut moved = field.clone();
            moved.name = to.to_string();
            renamed.push(moved);
        } else {
            renamed.push(field.clone());
        }
    }
    renamed
}
