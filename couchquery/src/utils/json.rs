//! JSON utility functions

use std::cmp::Ordering;

use serde_json::Value as JsonValue;

/// Resolve a dot-separated path inside a JSON document.
///
/// Returns `None` when any segment is absent or the path is empty.
///
/// # Example
///
/// ```
/// use serde_json::json;
/// use couchquery::utils::json::lookup_path;
///
/// let doc = json!({"address": {"city": "Szeged"}});
/// assert_eq!(lookup_path(&doc, "address.city"), Some(&json!("Szeged")));
/// assert_eq!(lookup_path(&doc, "address.zip"), None);
/// ```
pub fn lookup_path<'a>(doc: &'a JsonValue, path: &str) -> Option<&'a JsonValue> {
    if path.is_empty() {
        return None;
    }
    path.split('.')
        .try_fold(doc, |current, segment| current.as_object()?.get(segment))
}

/// Rank of a value's type in N1QL collation order
fn type_rank(value: &JsonValue) -> u8 {
    match value {
        JsonValue::Null => 0,
        JsonValue::Bool(false) => 1,
        JsonValue::Bool(true) => 2,
        JsonValue::Number(_) => 3,
        JsonValue::String(_) => 4,
        JsonValue::Array(_) => 5,
        JsonValue::Object(_) => 6,
    }
}

/// Compare two JSON values in N1QL collation order.
///
/// null < false < true < numbers < strings < arrays < objects. Numbers
/// compare numerically, strings by code point, arrays element-wise, and
/// objects by size and then by their sorted entries.
pub fn collate(a: &JsonValue, b: &JsonValue) -> Ordering {
    match (a, b) {
        (JsonValue::Number(x), JsonValue::Number(y)) => {
            let x = x.as_f64().unwrap_or(f64::NAN);
            let y = y.as_f64().unwrap_or(f64::NAN);
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (JsonValue::String(x), JsonValue::String(y)) => x.cmp(y),
        (JsonValue::Array(x), JsonValue::Array(y)) => x
            .iter()
            .zip(y.iter())
            .map(|(l, r)| collate(l, r))
            .find(|o| o.is_ne())
            .unwrap_or_else(|| x.len().cmp(&y.len())),
        (JsonValue::Object(x), JsonValue::Object(y)) => {
            x.len().cmp(&y.len()).then_with(|| {
                let mut left: Vec<_> = x.iter().collect();
                let mut right: Vec<_> = y.iter().collect();
                left.sort_by(|l, r| l.0.cmp(r.0));
                right.sort_by(|l, r| l.0.cmp(r.0));
                left.iter()
                    .zip(right.iter())
                    .map(|(l, r)| l.0.cmp(r.0).then_with(|| collate(l.1, r.1)))
                    .find(|o| o.is_ne())
                    .unwrap_or(Ordering::Equal)
            })
        }
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_lookup_top_level_and_nested() {
        let doc = json!({"a": 1, "b": {"c": {"d": true}}});
        assert_eq!(lookup_path(&doc, "a"), Some(&json!(1)));
        assert_eq!(lookup_path(&doc, "b.c.d"), Some(&json!(true)));
    }

    #[test]
    fn test_lookup_missing_and_empty() {
        let doc = json!({"a": {"b": null}});
        assert_eq!(lookup_path(&doc, "a.b"), Some(&JsonValue::Null));
        assert_eq!(lookup_path(&doc, "a.b.c"), None);
        assert_eq!(lookup_path(&doc, "x"), None);
        assert_eq!(lookup_path(&doc, ""), None);
    }

    #[test]
    fn test_collate_type_order() {
        let ordered = [
            json!(null),
            json!(false),
            json!(true),
            json!(-3),
            json!(2.5),
            json!("A"),
            json!("a"),
            json!([1]),
            json!({"k": 1}),
        ];
        for pair in ordered.windows(2) {
            assert_eq!(collate(&pair[0], &pair[1]), Ordering::Less, "{:?}", pair);
        }
    }

    #[test]
    fn test_collate_numbers_across_representations() {
        assert_eq!(collate(&json!(18), &json!(18.0)), Ordering::Equal);
        assert_eq!(collate(&json!(18), &json!(65)), Ordering::Less);
    }

    #[test]
    fn test_collate_arrays_elementwise() {
        assert_eq!(collate(&json!([1, 2]), &json!([1, 3])), Ordering::Less);
        assert_eq!(collate(&json!([1, 2]), &json!([1, 2, 0])), Ordering::Less);
        assert_eq!(collate(&json!([2]), &json!([1, 9])), Ordering::Greater);
    }
}
