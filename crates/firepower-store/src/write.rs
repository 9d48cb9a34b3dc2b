//! Resolution of written data against the stored document.

use firepower_diff::deep_equal;
use firepower_types::{Mapping, Path, PathSegment, SentinelKind, Value};

use crate::error::{StoreError, StoreResult};

/// The mapping inside written document data.
pub(crate) fn document_data(data: &Value) -> StoreResult<&Mapping> {
    data.as_mapping().ok_or_else(|| {
        StoreError::InvalidData(format!("document data must be a mapping, got {}", data.kind()))
    })
}

/// Data for a `set` write: the stored document that results.
///
/// With `merge`, mappings are merged field by field into `existing`;
/// otherwise `data` replaces the document.
pub(crate) fn resolve_set(
    existing: Option<&Mapping>,
    data: &Mapping,
    merge: bool,
    now: &str,
) -> StoreResult<Mapping> {
    if merge {
        let mut out = existing.cloned().unwrap_or_default();
        merge_into(&mut out, data, now)?;
        Ok(out)
    } else {
        let mut out = Mapping::new();
        merge_into(&mut out, data, now)?;
        Ok(out)
    }
}

/// Data for an `update` write. Keys are dotted field paths; each addressed
/// field is replaced, creating intermediate mappings as needed.
pub(crate) fn resolve_update(existing: &Mapping, data: &Mapping, now: &str) -> StoreResult<Mapping> {
    let mut out = existing.clone();
    for (field, value) in data {
        let path = Path::from_dotted(field)?;
        let current = lookup(&out, &path).cloned();
        let resolved = resolve_value(current.as_ref(), value, now)?;
        set_at(&mut out, path.segments(), resolved);
    }
    Ok(out)
}

fn merge_into(target: &mut Mapping, data: &Mapping, now: &str) -> StoreResult<()> {
    for (key, incoming) in data {
        if let (Some(Value::Mapping(existing)), Value::Mapping(nested)) = (target.get_mut(key), incoming) {
            merge_into(existing, nested, now)?;
            continue;
        }
        match resolve_value(target.get(key), incoming, now)? {
            Some(value) => {
                target.insert(key.clone(), value);
            }
            None => {
                target.remove(key);
            }
        }
    }
    Ok(())
}

/// The stored form of `incoming` given the field's `current` value.
/// `None` means the field is deleted.
fn resolve_value(current: Option<&Value>, incoming: &Value, now: &str) -> StoreResult<Option<Value>> {
    match incoming {
        Value::Sentinel(sentinel) => match sentinel.kind() {
            SentinelKind::Delete => Ok(None),
            SentinelKind::ServerTimestamp => Ok(Some(Value::Text(now.to_string()))),
            SentinelKind::Increment => {
                let by = sentinel.increment_by().unwrap_or(0.0);
                let base = current.and_then(Value::as_f64).unwrap_or(0.0);
                Ok(Some(Value::Number(base + by)))
            }
            SentinelKind::ArrayUnion => {
                let mut items = current.and_then(Value::as_sequence).cloned().unwrap_or_default();
                for element in sentinel.elements().unwrap_or_default() {
                    if !items.iter().any(|item| deep_equal(item, element)) {
                        items.push(element.clone());
                    }
                }
                Ok(Some(Value::Sequence(items)))
            }
            SentinelKind::ArrayRemove => {
                let removed = sentinel.elements().unwrap_or_default();
                let items: Vec<Value> = current
                    .and_then(Value::as_sequence)
                    .map(|items| {
                        items
                            .iter()
                            .filter(|item| !removed.iter().any(|r| deep_equal(item, r)))
                            .cloned()
                            .collect()
                    })
                    .unwrap_or_default();
                Ok(Some(Value::Sequence(items)))
            }
            SentinelKind::DocumentId => Err(StoreError::InvalidData(
                "document_id sentinel is only valid in queries".into(),
            )),
        },
        Value::Mapping(nested) => {
            let mut out = Mapping::new();
            merge_into(&mut out, nested, now)?;
            Ok(Some(Value::Mapping(out)))
        }
        Value::Sequence(items) => {
            if items.iter().any(Value::contains_sentinel) {
                return Err(StoreError::InvalidData(
                    "sentinels are not allowed inside arrays".into(),
                ));
            }
            Ok(Some(incoming.clone()))
        }
        _ => Ok(Some(incoming.clone())),
    }
}

fn lookup<'a>(doc: &'a Mapping, path: &Path) -> Option<&'a Value> {
    let (first, rest) = path.segments().split_first()?;
    let PathSegment::Key(key) = first else {
        return None;
    };
    let value = doc.get(key)?;
    if rest.is_empty() {
        return Some(value);
    }
    value.get_path(&Path::from(rest.to_vec()))
}

fn set_at(doc: &mut Mapping, segments: &[PathSegment], value: Option<Value>) {
    let Some((PathSegment::Key(key), rest)) = segments.split_first() else {
        return;
    };
    if rest.is_empty() {
        match value {
            Some(value) => {
                doc.insert(key.clone(), value);
            }
            None => {
                doc.remove(key);
            }
        }
        return;
    }
    if value.is_none() && !matches!(doc.get(key), Some(Value::Mapping(_))) {
        return;
    }
    let child = doc.entry(key.clone()).or_insert_with(Value::empty_mapping);
    if !matches!(child, Value::Mapping(_)) {
        *child = Value::empty_mapping();
    }
    if let Some(map) = child.as_mapping_mut() {
        set_at(map, rest, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use firepower_types::Sentinel;
    use serde_json::json;

    const NOW: &str = "2024-01-01T00:00:00.000Z";

    fn m(json: serde_json::Value) -> Mapping {
        Value::from(json).as_mapping().cloned().unwrap_or_default()
    }

    fn with(mut base: Mapping, key: &str, value: impl Into<Value>) -> Mapping {
        base.insert(key.to_string(), value.into());
        base
    }

    #[test]
    fn set_without_merge_replaces() {
        let out = resolve_set(Some(&m(json!({"a": 1, "b": 2}))), &m(json!({"c": 3})), false, NOW).unwrap();
        assert_eq!(out, m(json!({"c": 3})));
    }

    #[test]
    fn set_with_merge_merges_nested_mappings() {
        let out = resolve_set(
            Some(&m(json!({"a": 1, "p": {"x": 1, "y": 2}}))),
            &m(json!({"p": {"y": 5, "z": 6}})),
            true,
            NOW,
        )
        .unwrap();
        assert_eq!(out, m(json!({"a": 1, "p": {"x": 1, "y": 5, "z": 6}})));
    }

    #[test]
    fn increment_adds_or_initializes() {
        let data = with(Mapping::new(), "n", Sentinel::increment(2.0));
        let out = resolve_set(Some(&m(json!({"n": 5}))), &data, true, NOW).unwrap();
        assert_eq!(out, m(json!({"n": 7})));

        let out = resolve_set(Some(&m(json!({"n": "five"}))), &data, true, NOW).unwrap();
        assert_eq!(out, m(json!({"n": 2})));
    }

    #[test]
    fn delete_removes_field() {
        let data = with(Mapping::new(), "gone", Sentinel::delete());
        let out = resolve_set(Some(&m(json!({"gone": 1, "kept": 2}))), &data, true, NOW).unwrap();
        assert_eq!(out, m(json!({"kept": 2})));
    }

    #[test]
    fn server_timestamp_writes_now() {
        let data = with(Mapping::new(), "at", Sentinel::server_timestamp());
        let out = resolve_set(None, &data, true, NOW).unwrap();
        assert_eq!(out.get("at"), Some(&Value::from(NOW)));
    }

    #[test]
    fn array_union_and_remove_use_deep_equality() {
        let existing = m(json!({"tags": [1, {"k": "v"}]}));

        let union = with(
            Mapping::new(),
            "tags",
            Sentinel::array_union(vec![Value::from(json!({"k": "v"})), Value::from(2), Value::from(2)]),
        );
        let out = resolve_set(Some(&existing), &union, true, NOW).unwrap();
        assert_eq!(out, m(json!({"tags": [1, {"k": "v"}, 2]})));

        let remove = with(
            Mapping::new(),
            "tags",
            Sentinel::array_remove(vec![Value::from(json!({"k": "v"}))]),
        );
        let out = resolve_set(Some(&existing), &remove, true, NOW).unwrap();
        assert_eq!(out, m(json!({"tags": [1]})));
    }

    #[test]
    fn sentinels_inside_arrays_are_rejected() {
        let data = with(Mapping::new(), "list", vec![Value::from(Sentinel::delete())]);
        assert!(matches!(
            resolve_set(None, &data, true, NOW),
            Err(StoreError::InvalidData(_))
        ));
    }

    #[test]
    fn document_id_is_rejected() {
        let data = with(Mapping::new(), "id", Sentinel::document_id());
        assert!(resolve_set(None, &data, false, NOW).is_err());
    }

    #[test]
    fn update_addresses_dotted_fields() {
        let existing = m(json!({"user": {"first": "Ada", "last": "Byron"}, "n": 1}));
        let data = with(m(json!({"user.last": "Lovelace"})), "n", Sentinel::increment(1.0));
        let out = resolve_update(&existing, &data, NOW).unwrap();
        assert_eq!(out, m(json!({"user": {"first": "Ada", "last": "Lovelace"}, "n": 2})));
    }

    #[test]
    fn update_creates_and_replaces_intermediates() {
        let existing = m(json!({"a": 5}));
        let out = resolve_update(&existing, &m(json!({"a.b": 1, "x.y.z": true})), NOW).unwrap();
        assert_eq!(out, m(json!({"a": {"b": 1}, "x": {"y": {"z": true}}})));
    }

    #[test]
    fn update_deletes_nested_field() {
        let existing = m(json!({"p": {"x": 1, "y": 2}}));
        let data = with(Mapping::new(), "p.x", Sentinel::delete());
        let out = resolve_update(&existing, &data, NOW).unwrap();
        assert_eq!(out, m(json!({"p": {"y": 2}})));
    }

    #[test]
    fn update_rejects_bad_field_paths() {
        assert!(matches!(
            resolve_update(&Mapping::new(), &m(json!({"a..b": 1})), NOW),
            Err(StoreError::Type(_))
        ));
    }
}
