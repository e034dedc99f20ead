use std::collections::BTreeMap;

use serde_json::Value;

/// Named format values attached to a content range.
///
/// Keys are ordered so that maps print and compare deterministically.
pub type AttributeMap = BTreeMap<String, Value>;

/// Converts a JSON value into an attribute map.
///
/// Objects become maps (an empty object becomes an empty map); every other
/// value is not a mapping and yields `None`, which the algebra treats as the
/// empty map.
pub fn attrs(value: Value) -> Option<AttributeMap> {
    match value {
        Value::Object(object) => Some(object.into_iter().collect()),
        _ => None,
    }
}

fn non_empty(map: AttributeMap) -> Option<AttributeMap> {
    if map.is_empty() { None } else { Some(map) }
}

/// Applies `applied` on top of `base`.
///
/// Keys set in `applied` win. Keys only present in `base` are carried over
/// unchanged. Unless `keep_null` is set, keys that `applied` maps to null are
/// dropped from the result, so the removal is carried out rather than
/// recorded.
pub fn compose(
    base: Option<&AttributeMap>,
    applied: Option<&AttributeMap>,
    keep_null: bool,
) -> Option<AttributeMap> {
    let mut result: AttributeMap = match applied {
        Some(applied) if keep_null => applied.clone(),
        Some(applied) => applied
            .iter()
            .filter(|(_, value)| !value.is_null())
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect(),
        None => AttributeMap::new(),
    };

    if let Some(base) = base {
        for (key, value) in base {
            let touched = applied.is_some_and(|applied| applied.contains_key(key));
            if !touched {
                result.insert(key.clone(), value.clone());
            }
        }
    }

    non_empty(result)
}

/// Computes the attributes that turn `from` into `to`.
///
/// Every key whose value differs between the two (by deep equality) is
/// emitted with its value in `to`, or null when `to` lacks it.
pub fn diff(from: Option<&AttributeMap>, to: Option<&AttributeMap>) -> Option<AttributeMap> {
    let empty = AttributeMap::new();
    let from = from.unwrap_or(&empty);
    let to = to.unwrap_or(&empty);

    let mut result = AttributeMap::new();
    for key in from.keys().chain(to.keys()) {
        if from.get(key) != to.get(key) {
            let value = to.get(key).cloned().unwrap_or(Value::Null);
            result.insert(key.clone(), value);
        }
    }

    non_empty(result)
}

/// Computes the attributes that undo `applied` when it was composed onto
/// `base`.
///
/// Keys that `applied` changed are restored to their `base` value; keys that
/// `applied` introduced are mapped to null. The result is always a concrete
/// map: inverting a change that touched nothing restores nothing.
pub fn invert(applied: Option<&AttributeMap>, base: Option<&AttributeMap>) -> AttributeMap {
    let empty = AttributeMap::new();
    let applied = applied.unwrap_or(&empty);
    let base = base.unwrap_or(&empty);

    let mut inverted = AttributeMap::new();
    for (key, base_value) in base {
        if let Some(applied_value) = applied.get(key)
            && applied_value != base_value
        {
            inverted.insert(key.clone(), base_value.clone());
        }
    }
    for key in applied.keys() {
        if !base.contains_key(key) {
            inverted.insert(key.clone(), Value::Null);
        }
    }
    inverted
}

/// Transforms `b` against a concurrent `a`.
///
/// Without `priority`, `b` simply overwrites `a` and is returned as is. With
/// `priority`, `a` has already claimed the keys it touches, so only the keys
/// of `b` that `a` leaves alone survive (null values included).
pub fn transform(
    a: Option<&AttributeMap>,
    b: Option<&AttributeMap>,
    priority: bool,
) -> Option<AttributeMap> {
    let Some(a) = a else {
        return b.cloned();
    };
    let b = b?;
    if !priority {
        return Some(b.clone());
    }

    let result = b
        .iter()
        .filter(|(key, _)| !a.contains_key(*key))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();
    non_empty(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn map(value: Value) -> AttributeMap {
        attrs(value).unwrap()
    }

    #[test]
    fn attrs_rejects_non_objects() {
        assert_eq!(attrs(json!("bold")), None);
        assert_eq!(attrs(json!(null)), None);
        assert_eq!(attrs(json!([1, 2])), None);
        assert_eq!(attrs(json!({})), Some(AttributeMap::new()));
    }

    #[test]
    fn compose_adds_new_keys() {
        let base = map(json!({"bold": true}));
        let applied = map(json!({"italic": true}));
        assert_eq!(
            compose(Some(&base), Some(&applied), false),
            Some(map(json!({"bold": true, "italic": true})))
        );
    }

    #[test]
    fn compose_applied_value_wins() {
        let base = map(json!({"color": "red"}));
        let applied = map(json!({"color": "blue"}));
        assert_eq!(
            compose(Some(&base), Some(&applied), false),
            Some(map(json!({"color": "blue"})))
        );
    }

    #[test]
    fn compose_strips_null_removals() {
        let base = map(json!({"bold": true, "italic": true}));
        let applied = map(json!({"bold": null}));
        assert_eq!(
            compose(Some(&base), Some(&applied), false),
            Some(map(json!({"italic": true})))
        );
    }

    #[test]
    fn compose_keeps_null_on_request() {
        let base = map(json!({"bold": true}));
        let applied = map(json!({"bold": null}));
        assert_eq!(
            compose(Some(&base), Some(&applied), true),
            Some(map(json!({"bold": null})))
        );
    }

    #[test]
    fn compose_of_nothing_is_none() {
        let applied = map(json!({"bold": null}));
        assert_eq!(compose(None, Some(&applied), false), None);
        assert_eq!(compose(None, None, false), None);
    }

    #[test]
    fn compose_copies_nested_values() {
        let applied = map(json!({"link": {"href": "https://example.com"}}));
        let composed = compose(None, Some(&applied), false).unwrap();
        assert_eq!(composed["link"]["href"], json!("https://example.com"));
    }

    #[test]
    fn diff_emits_null_for_removed_keys() {
        let from = map(json!({"bold": true}));
        assert_eq!(diff(Some(&from), None), Some(map(json!({"bold": null}))));
    }

    #[test]
    fn diff_of_equal_maps_is_none() {
        let a = map(json!({"bold": true, "link": {"href": "x"}}));
        let b = map(json!({"bold": true, "link": {"href": "x"}}));
        assert_eq!(diff(Some(&a), Some(&b)), None);
    }

    #[test]
    fn diff_reports_changed_and_added() {
        let from = map(json!({"color": "red", "bold": true}));
        let to = map(json!({"color": "blue", "bold": true, "italic": true}));
        assert_eq!(
            diff(Some(&from), Some(&to)),
            Some(map(json!({"color": "blue", "italic": true})))
        );
    }

    #[test]
    fn invert_restores_removed_key() {
        let applied = map(json!({"bold": null}));
        let base = map(json!({"bold": true}));
        assert_eq!(
            invert(Some(&applied), Some(&base)),
            map(json!({"bold": true}))
        );
    }

    #[test]
    fn invert_nulls_introduced_keys() {
        let applied = map(json!({"italic": true, "color": "blue"}));
        let base = map(json!({"color": "red", "bold": true}));
        assert_eq!(
            invert(Some(&applied), Some(&base)),
            map(json!({"italic": null, "color": "red"}))
        );
    }

    #[test]
    fn invert_of_nothing_is_empty_map() {
        assert_eq!(invert(None, None), AttributeMap::new());
        let base = map(json!({"bold": true}));
        assert_eq!(invert(None, Some(&base)), AttributeMap::new());
    }

    #[test]
    fn transform_without_left_returns_right() {
        let b = map(json!({"bold": true}));
        assert_eq!(transform(None, Some(&b), true), Some(b.clone()));
    }

    #[test]
    fn transform_without_right_is_none() {
        let a = map(json!({"bold": true}));
        assert_eq!(transform(Some(&a), None, false), None);
    }

    #[test]
    fn transform_without_priority_keeps_right() {
        let a = map(json!({"bold": true}));
        let b = map(json!({"bold": false}));
        assert_eq!(transform(Some(&a), Some(&b), false), Some(b.clone()));
    }

    #[test]
    fn transform_with_priority_drops_claimed_keys() {
        let a = map(json!({"bold": true, "color": "red"}));
        let b = map(json!({"bold": false, "italic": null, "color": "blue"}));
        assert_eq!(
            transform(Some(&a), Some(&b), true),
            Some(map(json!({"italic": null})))
        );
    }
}
