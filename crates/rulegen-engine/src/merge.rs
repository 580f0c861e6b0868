//! Recursive deep merge of a patch object into a base document.
//!
//! Objects merge key by key. Everything else, arrays included, is replaced
//! wholesale by the patch value. Existing keys keep their position; new
//! keys are appended in patch order.

use serde_json::{Map, Value};

/// Merge `patch` into `base`.
pub fn merge_objects(base: &mut Map<String, Value>, patch: Map<String, Value>) {
    for (key, value) in patch {
        match value {
            Value::Object(incoming) => match base.get_mut(&key) {
                Some(Value::Object(existing)) => merge_objects(existing, incoming),
                _ => {
                    base.insert(key, Value::Object(incoming));
                }
            },
            other => {
                base.insert(key, other);
            }
        }
    }
}

/// Merge `patch` into a whole document. A non-object document is replaced.
pub fn merge_document(document: &mut Value, patch: Map<String, Value>) {
    match document {
        Value::Object(base) => merge_objects(base, patch),
        other => *other = Value::Object(patch),
    }
}
