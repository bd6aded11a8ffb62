//! Merge strategies for context values.

use serde_json::Value;

/// How [`ContextMemory::merge`](crate::ContextMemory::merge) combines a
/// patch with the stored value.
///
/// The strategy is an explicit parameter rather than implicit behavior:
/// `DeepUnion` dedupes array elements, which silently drops duplicate
/// application-level values that might be intentionally repeated, so
/// callers have to opt in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MergeStrategy {
    /// Overwrite top-level fields of the stored object with the patch's.
    Shallow,
    /// Recursively union nested objects; union arrays as a set (duplicates
    /// removed, first-seen order); overwrite scalars.
    #[default]
    DeepUnion,
}

pub(crate) fn apply(target: &Value, patch: &Value, strategy: MergeStrategy) -> Value {
    match strategy {
        MergeStrategy::Shallow => shallow(target, patch),
        MergeStrategy::DeepUnion => deep_union(target, patch),
    }
}

fn shallow(target: &Value, patch: &Value) -> Value {
    match (target, patch) {
        (Value::Object(existing), Value::Object(incoming)) => {
            let mut out = existing.clone();
            for (key, value) in incoming {
                out.insert(key.clone(), value.clone());
            }
            Value::Object(out)
        }
        _ => patch.clone(),
    }
}

fn deep_union(target: &Value, patch: &Value) -> Value {
    match (target, patch) {
        (Value::Object(existing), Value::Object(incoming)) => {
            let mut out = existing.clone();
            for (key, value) in incoming {
                let merged = match out.get(key) {
                    Some(current) => deep_union(current, value),
                    None => value.clone(),
                };
                out.insert(key.clone(), merged);
            }
            Value::Object(out)
        }
        (Value::Array(existing), Value::Array(incoming)) => {
            let mut out: Vec<Value> = Vec::with_capacity(existing.len() + incoming.len());
            for value in existing.iter().chain(incoming.iter()) {
                if !out.contains(value) {
                    out.push(value.clone());
                }
            }
            Value::Array(out)
        }
        _ => patch.clone(),
    }
}

/// JSON type label for error messages.
pub(crate) fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn deep_union_merges_nested_objects() {
        let first = json!({ "a": { "x": 1 } });
        let second = json!({ "a": { "y": 2 } });
        assert_eq!(
            deep_union(&first, &second),
            json!({ "a": { "x": 1, "y": 2 } })
        );
    }

    #[test]
    fn deep_union_unions_arrays_without_duplicates() {
        let first = json!({ "tags": ["ui", "web"] });
        let second = json!({ "tags": ["web", "api"] });
        assert_eq!(
            deep_union(&first, &second),
            json!({ "tags": ["ui", "web", "api"] })
        );
    }

    #[test]
    fn deep_union_overwrites_scalars() {
        let first = json!({ "count": 1, "label": "old" });
        let second = json!({ "count": 2 });
        assert_eq!(
            deep_union(&first, &second),
            json!({ "count": 2, "label": "old" })
        );
    }

    #[test]
    fn shallow_replaces_top_level_fields_wholesale() {
        let first = json!({ "a": { "x": 1 }, "b": 1 });
        let second = json!({ "a": { "y": 2 } });
        assert_eq!(
            shallow(&first, &second),
            json!({ "a": { "y": 2 }, "b": 1 })
        );
    }

    #[test]
    fn non_object_targets_are_replaced_by_the_patch() {
        let merged = deep_union(&json!(42), &json!({ "a": 1 }));
        assert_eq!(merged, json!({ "a": 1 }));
    }
}
