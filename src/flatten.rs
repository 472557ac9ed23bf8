//! Response Flattener (§4.C): turns an arbitrarily nested response object
//! into an ordered list of [`Record`]s suitable for filtering and tabular
//! rendering.

use crate::record::Record;
use serde_json::{Map, Value};

/// Response-metadata keys excluded when hunting for the primary list
/// (§4.C rule 1).
const METADATA_KEYS: &[&str] = &[
    "ResponseMetadata",
    "NextToken",
    "nextToken",
    "Marker",
    "IsTruncated",
    "PaginationToken",
];

fn is_metadata_key(key: &str) -> bool {
    METADATA_KEYS.contains(&key) || key.ends_with("Token")
}

/// Flatten a response into records. Empty/null responses produce an empty
/// list.
///
/// Envelope unwrapping: when the primary list's elements are themselves
/// plain wrappers around exactly one nested list-of-objects (e.g.
/// `Reservations[].Instances[]`), the wrapper level is transparent — each
/// leaf object becomes its own record, with the wrapper's other scalar
/// fields merged in, rather than one record per wrapper with the nested
/// list indexed in place. An entity with *more than one* nested
/// list-of-objects field (the common case — `Tags`, `SecurityGroups`, etc.
/// alongside each other) has no unique candidate to recurse into, so it
/// stops there and those sibling lists stay indexed in place (`Tags.0.Value`)
/// per rule 2.
pub fn flatten(response: &Value) -> Vec<Record> {
    let root = match response {
        Value::Object(map) => map,
        Value::Null => return Vec::new(),
        other => {
            // A bare scalar or array response: treat it as the sole record,
            // same as the "treat root as single record" fallback below.
            let mut record = Record::new();
            walk(&mut record, String::new(), other);
            return vec![record];
        }
    };

    match primary_list(root) {
        Some((_key, items)) if !items.is_empty() => {
            items.iter().flat_map(expand_item).collect()
        }
        Some((_key, _empty)) => Vec::new(),
        None => {
            if root.is_empty() {
                return Vec::new();
            }
            let mut record = Record::new();
            for (key, value) in root {
                if is_metadata_key(key) {
                    continue;
                }
                walk(&mut record, key.clone(), value);
            }
            vec![record]
        }
    }
}

/// Expand one primary-list element into one or more records, transparently
/// unwrapping a single nested list-of-objects field (see [`flatten`] docs).
fn expand_item(item: &Value) -> Vec<Record> {
    let map = match item {
        Value::Object(map) => map,
        other => {
            let mut record = Record::new();
            walk(&mut record, String::new(), other);
            return vec![record];
        }
    };

    let nested_candidates: Vec<(&str, &Vec<Value>)> = map
        .iter()
        .filter(|(key, _)| !is_metadata_key(key))
        .filter_map(|(key, value)| value.as_array().map(|arr| (key.as_str(), arr)))
        .filter(|(_, arr)| !arr.is_empty() && arr.iter().all(Value::is_object))
        .collect();

    if nested_candidates.len() == 1 {
        let (nested_key, nested_items) = nested_candidates[0];
        let mut parent = Record::new();
        for (key, value) in map {
            if key == nested_key || is_metadata_key(key) {
                continue;
            }
            walk(&mut parent, key.clone(), value);
        }
        return nested_items
            .iter()
            .flat_map(expand_item)
            .map(|nested| {
                let mut merged = parent.clone();
                for (path, value) in nested.iter() {
                    merged.insert(path.to_string(), value.clone());
                }
                merged
            })
            .collect();
    }

    let mut record = Record::new();
    for (key, value) in map {
        if is_metadata_key(key) {
            continue;
        }
        walk(&mut record, key.clone(), value);
    }
    vec![record]
}

/// Find the unique non-metadata child whose value is an array, and return
/// it normalized to "one value per record" form: objects pass through,
/// scalars are wrapped as single-field records keyed by the list's own
/// field name, and mixed lists wrap their scalar elements as `{value: x}`
/// per the mixed-type edge case.
fn primary_list(root: &Map<String, Value>) -> Option<(&str, Vec<Value>)> {
    let candidates: Vec<(&str, &Vec<Value>)> = root
        .iter()
        .filter(|(key, _)| !is_metadata_key(key))
        .filter_map(|(key, value)| value.as_array().map(|arr| (key.as_str(), arr)))
        .collect();

    if candidates.len() != 1 {
        return None;
    }
    let (key, items) = candidates[0];

    let has_object = items.iter().any(Value::is_object);
    let has_scalar = items.iter().any(|v| !v.is_object());

    let normalized: Vec<Value> = if has_object && has_scalar {
        items
            .iter()
            .map(|item| {
                if item.is_object() {
                    item.clone()
                } else {
                    let mut wrapped = Map::new();
                    wrapped.insert("value".to_string(), item.clone());
                    Value::Object(wrapped)
                }
            })
            .collect()
    } else if has_scalar {
        items
            .iter()
            .map(|item| {
                let mut wrapped = Map::new();
                wrapped.insert(key.to_string(), item.clone());
                Value::Object(wrapped)
            })
            .collect()
    } else {
        items.clone()
    };

    Some((key, normalized))
}

fn walk(record: &mut Record, prefix: String, value: &Value) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                let path = join(&prefix, key);
                walk(record, path, child);
            }
        }
        Value::Array(items) => {
            for (idx, item) in items.iter().enumerate() {
                let path = join(&prefix, &idx.to_string());
                walk(record, path, item);
            }
        }
        scalar => {
            record.insert(prefix, scalar.clone());
        }
    }
}

fn join(prefix: &str, segment: &str) -> String {
    if prefix.is_empty() {
        segment.to_string()
    } else {
        format!("{prefix}.{segment}")
    }
}
