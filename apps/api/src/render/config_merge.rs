//! Template config ⊕ CV customization merge.

use serde_json::{Map, Value};

/// Merges a template's base config with a per-CV customization override.
///
/// Pure — inputs are never mutated. A null base is treated as an empty
/// object; a null/absent/empty override returns the base unchanged. For each
/// top-level override key where both sides are objects, the nested object is
/// overwritten field by field — one level only, grandchildren are replaced
/// wholesale. Any other value shape (array, scalar, type mismatch) replaces
/// the base value entirely.
pub fn merge(base: Option<&Value>, overlay: Option<&Value>) -> Value {
    let mut merged = match base {
        Some(Value::Object(map)) => map.clone(),
        _ => Map::new(),
    };

    if let Some(Value::Object(overlay)) = overlay {
        for (key, value) in overlay {
            match (merged.get_mut(key), value) {
                (Some(Value::Object(nested)), Value::Object(overlay_nested)) => {
                    for (k, v) in overlay_nested {
                        nested.insert(k.clone(), v.clone());
                    }
                }
                _ => {
                    merged.insert(key.clone(), value.clone());
                }
            }
        }
    }

    Value::Object(merged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_nested_override_wins_field_by_field() {
        let base = json!({"color": "red", "font": {"family": "Arial", "size": 12}});
        let overlay = json!({"font": {"size": 14}});
        let merged = merge(Some(&base), Some(&overlay));
        assert_eq!(
            merged,
            json!({"color": "red", "font": {"family": "Arial", "size": 14}})
        );
    }

    #[test]
    fn test_null_override_returns_base_value() {
        let base = json!({"a": 1});
        assert_eq!(merge(Some(&base), None), json!({"a": 1}));
    }

    #[test]
    fn test_empty_override_returns_base_value() {
        let base = json!({"a": 1});
        assert_eq!(merge(Some(&base), Some(&json!({}))), json!({"a": 1}));
    }

    #[test]
    fn test_null_base_treated_as_empty_object() {
        let overlay = json!({"a": 1});
        assert_eq!(merge(None, Some(&overlay)), json!({"a": 1}));
    }

    #[test]
    fn test_arrays_and_scalars_replace_wholesale() {
        let base = json!({"tags": ["a", "b"], "size": 10});
        let overlay = json!({"tags": ["c"], "size": {"w": 1}});
        let merged = merge(Some(&base), Some(&overlay));
        assert_eq!(merged, json!({"tags": ["c"], "size": {"w": 1}}));
    }

    #[test]
    fn test_grandchildren_replaced_not_merged() {
        let base = json!({"layout": {"margins": {"top": 1, "bottom": 2}}});
        let overlay = json!({"layout": {"margins": {"top": 9}}});
        let merged = merge(Some(&base), Some(&overlay));
        // Second-level values are overwritten wholesale — "bottom" is gone.
        assert_eq!(merged, json!({"layout": {"margins": {"top": 9}}}));
    }

    #[test]
    fn test_inputs_are_not_mutated() {
        let base = json!({"font": {"family": "Arial"}});
        let overlay = json!({"font": {"family": "Inter"}});
        let _ = merge(Some(&base), Some(&overlay));
        assert_eq!(base, json!({"font": {"family": "Arial"}}));
        assert_eq!(overlay, json!({"font": {"family": "Inter"}}));
    }

    #[test]
    fn test_merge_is_deterministic() {
        let base = json!({"a": {"x": 1}, "b": 2});
        let overlay = json!({"a": {"y": 3}, "c": 4});
        assert_eq!(
            merge(Some(&base), Some(&overlay)),
            merge(Some(&base), Some(&overlay))
        );
    }
}
