//! Filter & Projection Engine (§4.G): value filters, column selection, and
//! keys-mode path enumeration.

use crate::extract::{last_segment, matches_suffix};
use crate::record::Record;
use indexmap::IndexMap;
use tracing::warn;

/// A record matches iff every token is a case-insensitive substring of some
/// scalar value in that record (§4.G value filters).
pub fn apply_value_filters<'r>(records: &'r [Record], tokens: &[String]) -> Vec<&'r Record> {
    records
        .iter()
        .filter(|record| tokens.iter().all(|token| record.any_value_contains_ci(token)))
        .collect()
}

/// Resolve each column token against the records the same way the Field
/// Extractor does (exact path -> last segment -> substring), preserving the
/// user's token order. Tokens that resolve to nothing are dropped; under
/// `debug` a warning is logged for each.
pub fn resolve_columns(records: &[Record], tokens: &[String], debug: bool) -> Vec<String> {
    let mut columns = Vec::new();
    for token in tokens {
        match resolve_one_column(records, token) {
            Some(path) => columns.push(path),
            None => {
                if debug {
                    warn!(column = %token, "column token did not resolve to any record path");
                }
            }
        }
    }
    columns
}

fn resolve_one_column(records: &[Record], token: &str) -> Option<String> {
    if records.iter().any(|r| r.get(token).is_some()) {
        return Some(token.to_string());
    }
    if let Some(path) = records
        .iter()
        .flat_map(Record::paths)
        .find(|path| matches_suffix(path, token))
    {
        return Some(path.to_string());
    }
    let needle = token.to_lowercase();
    records
        .iter()
        .flat_map(Record::paths)
        .find(|path| last_segment(path).to_lowercase().contains(&needle))
        .map(str::to_string)
}

/// Default column set when no `--` column tokens were given: the first
/// (discovery-order) ≤6 scalar paths appearing in at least half the
/// records, preferring paths that end in `Name`, `Id`, `Arn`, `State*`,
/// `Status*` (§4.G).
pub fn default_columns(records: &[Record]) -> Vec<String> {
    if records.is_empty() {
        return Vec::new();
    }

    let mut counts: IndexMap<String, usize> = IndexMap::new();
    for record in records {
        for path in record.paths() {
            *counts.entry(path.to_string()).or_insert(0) += 1;
        }
    }

    let threshold = (records.len() + 1) / 2; // ceil(len / 2), i.e. >= 50%
    let mut eligible: Vec<(bool, usize, String)> = counts
        .into_iter()
        .filter(|(_, count)| *count >= threshold)
        .map(|(path, _)| path)
        .enumerate()
        .map(|(discovery_order, path)| (!is_preferred(&path), discovery_order, path))
        .collect();

    eligible.sort_by(|a, b| (a.0, a.1).cmp(&(b.0, b.1)));
    eligible.into_iter().map(|(_, _, path)| path).take(6).collect()
}

fn is_preferred(path: &str) -> bool {
    let last = last_segment(path);
    last == "Name"
        || last == "Id"
        || last == "Arn"
        || last.starts_with("State")
        || last.starts_with("Status")
}

/// `--keys` mode: the sorted union of all dotted paths across records.
pub fn all_keys(records: &[Record]) -> Vec<String> {
    let mut keys: Vec<String> = records
        .iter()
        .flat_map(Record::paths)
        .map(str::to_string)
        .collect();
    keys.sort();
    keys.dedup();
    keys
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flatten::flatten;
    use serde_json::json;

    fn records() -> Vec<Record> {
        flatten(&json!({
            "Reservations": [
                {"Instances": [
                    {"InstanceId": "i-1", "State": {"Name": "running"}},
                    {"InstanceId": "i-2", "State": {"Name": "stopped"}}
                ]},
                {"Instances": [
                    {"InstanceId": "i-3", "State": {"Name": "running"}}
                ]}
            ]
        }))
        // Reservations unwraps transparently (its only nested list is
        // Instances), so this yields three flat records: i-1, i-2, i-3.
    }

    #[test]
    fn value_filter_keeps_only_matching_records() {
        let records = records();
        let matched = apply_value_filters(&records, &["running".to_string()]);
        assert_eq!(matched.len(), 2);
    }

    #[test]
    fn value_filter_is_idempotent() {
        let records = records();
        let once = apply_value_filters(&records, &["running".to_string()]);
        let twice: Vec<&Record> = apply_value_filters(&records, &["running".to_string()])
            .into_iter()
            .filter(|r| once.iter().any(|o| *o == *r))
            .collect();
        assert_eq!(once.len(), twice.len());
    }

    #[test]
    fn resolve_columns_preserves_user_order() {
        let records = records();
        let columns = resolve_columns(
            &records,
            &["State.Name".to_string(), "InstanceId".to_string()],
            false,
        );
        assert_eq!(columns, vec!["State.Name", "InstanceId"]);
    }

    #[test]
    fn unresolved_column_tokens_are_dropped() {
        let records = records();
        let columns = resolve_columns(&records, &["NoSuchField".to_string()], false);
        assert!(columns.is_empty());
    }

    #[test]
    fn keys_mode_is_a_superset_of_default_columns() {
        let records = records();
        let keys = all_keys(&records);
        let defaults = default_columns(&records);
        assert!(defaults.iter().all(|c| keys.contains(c)));
    }
}
