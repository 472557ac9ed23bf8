//! Small helpers for the hand-rolled typed-SDK-to-`Value` conversions in
//! `sdk::services::*`, factoring out the `if let Some(x) = &thing.field`
//! dance the teacher's per-service wrappers repeat field by field.

use serde_json::{Map, Value};

pub fn insert_string(map: &mut Map<String, Value>, key: &str, value: &Option<String>) {
    if let Some(value) = value {
        map.insert(key.to_string(), Value::String(value.clone()));
    }
}

pub fn insert_i32(map: &mut Map<String, Value>, key: &str, value: Option<i32>) {
    if let Some(value) = value {
        map.insert(key.to_string(), Value::Number(value.into()));
    }
}

pub fn insert_i64(map: &mut Map<String, Value>, key: &str, value: Option<i64>) {
    if let Some(value) = value {
        map.insert(key.to_string(), Value::Number(value.into()));
    }
}

pub fn insert_bool(map: &mut Map<String, Value>, key: &str, value: Option<bool>) {
    if let Some(value) = value {
        map.insert(key.to_string(), Value::Bool(value));
    }
}

pub fn insert_string_list(map: &mut Map<String, Value>, key: &str, value: &Option<Vec<String>>) {
    if let Some(items) = value {
        map.insert(
            key.to_string(),
            Value::Array(items.iter().cloned().map(Value::String).collect()),
        );
    }
}

pub fn insert_timestamp<T: std::fmt::Display>(map: &mut Map<String, Value>, key: &str, value: Option<T>) {
    if let Some(value) = value {
        map.insert(key.to_string(), Value::String(value.to_string()));
    }
}
