//! Field Extractor (§4.D): pulls the scalar values of a (possibly fuzzy)
//! field name across a set of records.

use crate::catalog::actions::entity_name;
use crate::record::Record;
use serde_json::Value;

/// `extract(records, field_hint)`. Tries, in order, an exact dotted-path
/// match, an exact last-segment match, then a case-insensitive substring
/// match on the last segment — stopping at the first non-empty result.
/// Duplicates are dropped, preserving first occurrence; nulls are dropped.
pub fn extract(records: &[Record], field_hint: &str) -> Vec<Value> {
    if field_hint.is_empty() {
        return Vec::new();
    }

    let by_exact_path = collect(records, |path, _| path == field_hint);
    if !by_exact_path.is_empty() {
        return by_exact_path;
    }

    let by_exact_last_segment = collect(records, |path, _| matches_suffix(path, field_hint));
    if !by_exact_last_segment.is_empty() {
        return by_exact_last_segment;
    }

    let needle = field_hint.to_lowercase();
    collect(records, |path, _| {
        last_segment(path).to_lowercase().contains(&needle)
    })
}

/// Extract using an explicit hint if present, otherwise fall back to the
/// standard AWS field names in priority order: `Name`, `Id`, `Arn`,
/// `<EntityName>Name`, `<EntityName>Id`, `<EntityName>Arn`, where
/// `EntityName` is derived from the source operation's name
/// (§4.D rule 4).
pub fn extract_with_aws_fallback(
    records: &[Record],
    field_hint: Option<&str>,
    source_operation: &str,
) -> Vec<Value> {
    if let Some(hint) = field_hint {
        let result = extract(records, hint);
        if !result.is_empty() {
            return result;
        }
    }

    let entity = entity_name(source_operation);
    for candidate in [
        "Name".to_string(),
        "Id".to_string(),
        "Arn".to_string(),
        format!("{entity}Name"),
        format!("{entity}Id"),
        format!("{entity}Arn"),
    ] {
        let result = extract(records, &candidate);
        if !result.is_empty() {
            return result;
        }
    }
    Vec::new()
}

pub(crate) fn last_segment(path: &str) -> &str {
    path.rsplit('.').next().unwrap_or(path)
}

/// Tier-2 match: `hint` matches `path` either as the whole path or as a
/// trailing run of dotted segments, e.g. hint `Name` matches `Buckets.Name`
/// and hint `State.Name` matches `Instances.0.State.Name` (§4.D rule 2).
pub(crate) fn matches_suffix(path: &str, hint: &str) -> bool {
    path == hint || path.ends_with(&format!(".{hint}"))
}

fn collect(records: &[Record], matches: impl Fn(&str, &Value) -> bool) -> Vec<Value> {
    let mut seen = Vec::new();
    let mut out = Vec::new();
    for record in records {
        for (path, value) in record.iter() {
            if value.is_null() {
                continue;
            }
            if matches(path, value) && !seen.contains(value) {
                seen.push(value.clone());
                out.push(value.clone());
            }
        }
    }
    out
}
