//! Rendering: table, JSON, and keys-mode output (§4.G, §4.H modes).
//!
//! Stdout only carries rendered results — logging and errors go to
//! stderr (§6) — so every function here returns a `String` the caller
//! prints with `println!`, rather than writing directly.

use crate::record::Record;
use comfy_table::{modifiers, presets, Table};
use serde_json::Value;

/// Render `records` as a table. `columns` is the already-resolved column
/// list (either user-supplied `--` tokens or the default selection);
/// missing values render as an empty cell rather than dropping the row.
pub fn render_table(records: &[Record], columns: &[String]) -> String {
    let mut table = Table::new();
    table
        .load_preset(presets::UTF8_FULL)
        .apply_modifier(modifiers::UTF8_ROUND_CORNERS)
        .apply_modifier(modifiers::UTF8_SOLID_INNER_BORDERS);

    table.set_header(columns.iter().map(String::as_str));

    for record in records {
        let row: Vec<String> = columns
            .iter()
            .map(|column| record.get(column).map(render_cell).unwrap_or_default())
            .collect();
        table.add_row(row);
    }

    table.to_string()
}

/// Render `records` as a JSON array, optionally projected to `columns`
/// (§4.G JSON mode: "applying column projection if column filters are
/// present").
pub fn render_json(records: &[Record], columns: Option<&[String]>) -> serde_json::Result<String> {
    let values: Vec<Value> = match columns {
        Some(columns) if !columns.is_empty() => records
            .iter()
            .map(|record| {
                let mut obj = serde_json::Map::new();
                for column in columns {
                    if let Some(value) = record.get(column) {
                        obj.insert(column.clone(), value.clone());
                    }
                }
                Value::Object(obj)
            })
            .collect(),
        _ => records
            .iter()
            .map(|record| {
                let obj: serde_json::Map<String, Value> =
                    record.iter().map(|(k, v)| (k.to_string(), v.clone())).collect();
                Value::Object(obj)
            })
            .collect(),
    };
    serde_json::to_string_pretty(&Value::Array(values))
}

/// `--keys` mode: one dotted path per line, sorted (§4.G keys mode).
pub fn render_keys(records: &[Record]) -> String {
    crate::filter::all_keys(records).join("\n")
}

fn render_cell(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flatten::flatten;
    use serde_json::json;

    fn sample_records() -> Vec<Record> {
        flatten(&json!({
            "Buckets": [
                {"Name": "prod-backup", "CreationDate": "2024-01-01"},
                {"Name": "prod-logs", "CreationDate": "2024-01-02"}
            ]
        }))
    }

    #[test]
    fn table_renders_one_row_per_record_in_column_order() {
        let records = sample_records();
        let columns = vec!["Name".to_string(), "CreationDate".to_string()];
        let table = render_table(&records, &columns);
        assert!(table.contains("prod-backup"));
        assert!(table.contains("prod-logs"));
        let name_pos = table.find("Name").unwrap();
        let date_pos = table.find("CreationDate").unwrap();
        assert!(name_pos < date_pos);
    }

    #[test]
    fn missing_column_renders_as_empty_cell_not_a_dropped_row() {
        let records = sample_records();
        let columns = vec!["Name".to_string(), "Arn".to_string()];
        let table = render_table(&records, &columns);
        // both bucket names still present as rows despite missing Arn
        assert!(table.contains("prod-backup"));
        assert!(table.contains("prod-logs"));
    }

    #[test]
    fn json_projects_only_requested_columns() {
        let records = sample_records();
        let rendered = render_json(&records, Some(&["Name".to_string()])).unwrap();
        let parsed: Value = serde_json::from_str(&rendered).unwrap();
        let arr = parsed.as_array().unwrap();
        assert_eq!(arr.len(), 2);
        assert!(arr[0].get("Name").is_some());
        assert!(arr[0].get("CreationDate").is_none());
    }

    #[test]
    fn json_with_no_projection_includes_all_paths() {
        let records = sample_records();
        let rendered = render_json(&records, None).unwrap();
        let parsed: Value = serde_json::from_str(&rendered).unwrap();
        assert!(parsed[0].get("CreationDate").is_some());
    }

    #[test]
    fn keys_mode_lists_sorted_union_of_paths() {
        let records = sample_records();
        let keys = render_keys(&records);
        assert_eq!(keys, "CreationDate\nName");
    }
}
