//! Shared parameter types: the working parameter map the resolver builds
//! up, user-supplied `-p` overrides, and `-i` resolution hints.

use crate::catalog::model::FieldKind;
use crate::error::AwsqueryError;
use indexmap::IndexMap;
use serde_json::Value;

/// The parameter map passed to one concrete SDK call, built up by the
/// resolver and ultimately handed to the invoker. Ordered so dry-run
/// descriptions and debug traces are deterministic.
pub type ParamMap = IndexMap<String, Value>;

/// One `-p KEY=VALUE` pair from the CLI, parsed but not yet merged.
#[derive(Debug, Clone)]
pub struct UserParameter {
    pub key: String,
    pub value: String,
}

impl UserParameter {
    pub fn parse(raw: &str) -> Result<Self, AwsqueryError> {
        let (key, value) = raw.split_once('=').ok_or_else(|| {
            AwsqueryError::BadArgument(format!("-p value '{raw}' is not of the form KEY=VALUE"))
        })?;
        if key.is_empty() {
            return Err(AwsqueryError::BadArgument(format!(
                "-p value '{raw}' has an empty key"
            )));
        }
        Ok(Self { key: key.to_string(), value: value.to_string() })
    }
}

/// Merge repeatable `-p` pairs into a [`ParamMap`]. Multiple occurrences of
/// the same key accumulate into a JSON array (§3 UserParameter).
pub fn merge_user_parameters(pairs: &[UserParameter]) -> ParamMap {
    let mut map: ParamMap = IndexMap::new();
    for pair in pairs {
        let value = Value::String(pair.value.clone());
        map.entry(pair.key.clone())
            .and_modify(|existing| accumulate(existing, value.clone()))
            .or_insert(value);
    }
    map
}

fn accumulate(existing: &mut Value, incoming: Value) {
    match existing {
        Value::Array(items) => items.push(incoming),
        other => {
            let first = std::mem::replace(other, Value::Null);
            *other = Value::Array(vec![first, incoming]);
        }
    }
}

/// Wrap a scalar `-p` value into a single-element list when the target
/// field's catalog kind says it should be a list and the user passed one
/// bare scalar (§3 UserParameter).
pub fn coerce_to_field_kind(value: Value, kind: FieldKind) -> Value {
    match (kind, value) {
        (FieldKind::List, Value::Array(items)) => Value::Array(items),
        (FieldKind::List, scalar) => Value::Array(vec![scalar]),
        (_, value) => value,
    }
}

/// `(source_hint, field_hint, limit)` parsed from `-i source:field:limit`;
/// any component may be empty (§3 ResolutionHint).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolutionHint {
    pub source_hint: Option<String>,
    pub field_hint: Option<String>,
    pub limit: Option<usize>,
}

impl ResolutionHint {
    pub fn parse(raw: &str) -> Result<Self, AwsqueryError> {
        let mut parts = raw.splitn(3, ':');
        let source = parts.next().unwrap_or("");
        let field = parts.next().unwrap_or("");
        let limit = parts.next().unwrap_or("");

        let limit = if limit.is_empty() {
            None
        } else {
            Some(limit.parse::<usize>().map_err(|_| {
                AwsqueryError::BadArgument(format!("-i limit '{limit}' is not a number"))
            })?)
        };

        Ok(Self {
            source_hint: non_empty(source),
            field_hint: non_empty(field),
            limit,
        })
    }
}

fn non_empty(s: &str) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merges_repeated_keys_into_array() {
        let pairs = vec![
            UserParameter::parse("Key=a").unwrap(),
            UserParameter::parse("Key=b").unwrap(),
        ];
        let map = merge_user_parameters(&pairs);
        assert_eq!(map.get("Key"), Some(&Value::Array(vec!["a".into(), "b".into()])));
    }

    #[test]
    fn single_occurrence_stays_scalar() {
        let pairs = vec![UserParameter::parse("Region=us-east-1").unwrap()];
        let map = merge_user_parameters(&pairs);
        assert_eq!(map.get("Region"), Some(&Value::String("us-east-1".into())));
    }

    #[test]
    fn parse_rejects_missing_equals() {
        assert!(UserParameter::parse("Key").is_err());
    }

    #[test]
    fn hint_parses_all_components() {
        let hint = ResolutionHint::parse("list-clus:cluster:5").unwrap();
        assert_eq!(hint.source_hint.as_deref(), Some("list-clus"));
        assert_eq!(hint.field_hint.as_deref(), Some("cluster"));
        assert_eq!(hint.limit, Some(5));
    }

    #[test]
    fn hint_components_are_all_optional() {
        assert_eq!(ResolutionHint::parse("::5").unwrap().limit, Some(5));
        assert_eq!(
            ResolutionHint::parse(":username").unwrap().field_hint.as_deref(),
            Some("username")
        );
        assert_eq!(
            ResolutionHint::parse("desc-load:arn:3").unwrap(),
            ResolutionHint {
                source_hint: Some("desc-load".into()),
                field_hint: Some("arn".into()),
                limit: Some(3),
            }
        );
    }

    #[test]
    fn hint_rejects_non_numeric_limit() {
        assert!(ResolutionHint::parse("src:field:abc").is_err());
    }
}
