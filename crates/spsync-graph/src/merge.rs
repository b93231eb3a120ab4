//! Deep merge of JSON objects
//!
//! Used to lay caller-supplied column details over the default column
//! definition. Objects merge key by key, recursively; any other value
//! (scalars, arrays, null) from a later source replaces the earlier one.

use serde_json::{Map, Value};

/// Merges `overlay` into `base` in place
pub fn merge_into(base: &mut Map<String, Value>, overlay: &Map<String, Value>) {
    for (key, value) in overlay {
        match value {
            Value::Object(nested) => {
                let slot = base
                    .entry(key.clone())
                    .or_insert_with(|| Value::Object(Map::new()));
                if !slot.is_object() {
                    *slot = Value::Object(Map::new());
                }
                if let Value::Object(target) = slot {
                    merge_into(target, nested);
                }
            }
            other => {
                base.insert(key.clone(), other.clone());
            }
        }
    }
}

/// Merges `sources` left to right into a fresh object
///
/// Non-object sources are ignored.
pub fn deep_merge<'a>(sources: impl IntoIterator<Item = &'a Value>) -> Value {
    let mut out = Map::new();
    for source in sources {
        if let Value::Object(map) = source {
            merge_into(&mut out, map);
        }
    }
    Value::Object(out)
}
