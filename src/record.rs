//! A flattened response row: a dotted path to scalar value map that
//! preserves insertion (discovery) order, per the Response Flattener
//! contract.

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;

/// One row produced by [`crate::flatten::flatten`]. Keys are dotted paths
/// (`State.Name`, `Tags.0.Value`); values are scalars (string, number,
/// bool, or null) — never nested objects or arrays.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct Record(pub IndexMap<String, Value>);

impl Record {
    pub fn new() -> Self {
        Self(IndexMap::new())
    }

    pub fn insert(&mut self, path: impl Into<String>, value: Value) {
        self.0.insert(path.into(), value);
    }

    pub fn get(&self, path: &str) -> Option<&Value> {
        self.0.get(path)
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.0.values()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// True iff any scalar value in this record contains `needle` as a
    /// case-insensitive substring (used by the value-filter pass).
    pub fn any_value_contains_ci(&self, needle: &str) -> bool {
        self.0.values().any(|v| value_contains_ci(v, needle))
    }
}

fn value_contains_ci(value: &Value, needle: &str) -> bool {
    let needle = needle.to_lowercase();
    match value {
        Value::String(s) => s.to_lowercase().contains(&needle),
        Value::Number(n) => n.to_string().to_lowercase().contains(&needle),
        Value::Bool(b) => b.to_string().contains(&needle),
        Value::Null => false,
        // Records only ever hold scalars, but guard defensively.
        Value::Array(_) | Value::Object(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_contains_is_case_insensitive() {
        let mut r = Record::new();
        r.insert("State.Name", Value::String("Running".into()));
        assert!(r.any_value_contains_ci("running"));
        assert!(r.any_value_contains_ci("RUN"));
        assert!(!r.any_value_contains_ci("stopped"));
    }

    #[test]
    fn paths_preserve_insertion_order() {
        let mut r = Record::new();
        r.insert("b", Value::String("2".into()));
        r.insert("a", Value::String("1".into()));
        assert_eq!(r.paths().collect::<Vec<_>>(), vec!["b", "a"]);
    }
}
