//! JSON flattening into line-oriented `path: value` text.

use std::path::Path;

use serde_json::Value;

use super::ExtractError;
use crate::models::Metadata;

/// Root-object fields copied verbatim into the document metadata.
const WELL_KNOWN_FIELDS: &[&str] = &[
    "title",
    "name",
    "description",
    "summary",
    "version",
    "date",
    "author",
];

pub(super) fn extract_text(path: &Path) -> Result<String, ExtractError> {
    let value = read_json(path)?;
    Ok(flatten(&value))
}

pub(super) fn extract_metadata(path: &Path) -> Metadata {
    match read_json(path) {
        Ok(value) => metadata_for(&value),
        Err(e) => {
            tracing::error!(
                "Failed to extract metadata from JSON {}: {}",
                path.display(),
                e
            );
            super::base_metadata(".json", "basic", super::Extractor::Json.tag())
        }
    }
}

fn read_json(path: &Path) -> Result<Value, ExtractError> {
    let content = std::fs::read_to_string(path)?;
    serde_json::from_str(&content).map_err(|e| ExtractError::Json(e.to_string()))
}

/// Flatten a JSON value, one leaf per line.
///
/// Object keys keep declaration order and array items keep index order.
/// Nested containers extend the prefix with `key: ` or `[i] `.
pub fn flatten(value: &Value) -> String {
    let mut lines = Vec::new();
    flatten_into(value, "", &mut lines);
    lines.join("\n")
}

fn flatten_into(value: &Value, prefix: &str, lines: &mut Vec<String>) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                if child.is_object() || child.is_array() {
                    flatten_into(child, &format!("{}{}: ", prefix, key), lines);
                } else {
                    lines.push(format!("{}{}: {}", prefix, key, scalar_text(child)));
                }
            }
        }
        Value::Array(items) => {
            for (i, child) in items.iter().enumerate() {
                if child.is_object() || child.is_array() {
                    flatten_into(child, &format!("{}[{}] ", prefix, i), lines);
                } else {
                    lines.push(format!("{}[{}] {}", prefix, i, scalar_text(child)));
                }
            }
        }
        scalar => lines.push(format!("{}{}", prefix, scalar_text(scalar))),
    }
}

/// Strings render bare; everything else renders as JSON.
fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn metadata_for(value: &Value) -> Metadata {
    let mut metadata = super::base_metadata(".json", "json_parser", super::Extractor::Json.tag());

    match value {
        Value::Object(map) => {
            let keys: Vec<Value> = map.keys().map(|k| Value::from(k.as_str())).collect();
            metadata.insert("json_keys".to_string(), Value::Array(keys));
            metadata.insert("json_structure".to_string(), Value::from("object"));
            for field in WELL_KNOWN_FIELDS {
                if let Some(found) = map.get(*field) {
                    metadata.insert(field.to_string(), found.clone());
                }
            }
        }
        Value::Array(items) => {
            metadata.insert("json_structure".to_string(), Value::from("array"));
            metadata.insert("json_array_length".to_string(), Value::from(items.len()));
        }
        _ => {}
    }
    metadata
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn flattens_nested_structure_in_order() {
        let value: Value = serde_json::from_str(r#"{"a": {"b": 1}, "c": [2, 3]}"#).unwrap();
        assert_eq!(flatten(&value), "a: b: 1\nc: [0] 2\nc: [1] 3");
    }

    #[test]
    fn keeps_declaration_order_not_sorted() {
        let value: Value = serde_json::from_str(r#"{"zeta": 1, "alpha": 2}"#).unwrap();
        assert_eq!(flatten(&value), "zeta: 1\nalpha: 2");
    }

    #[test]
    fn flattens_arrays_of_objects() {
        let value = json!([{"id": "CVE-1", "sev": "high"}, [true, null]]);
        assert_eq!(
            flatten(&value),
            "[0] id: CVE-1\n[0] sev: high\n[1] [0] true\n[1] [1] null"
        );
    }

    #[test]
    fn scalar_root_is_single_line() {
        assert_eq!(flatten(&json!("just text")), "just text");
        assert_eq!(flatten(&json!(42)), "42");
    }

    #[test]
    fn empty_containers_produce_no_lines() {
        assert_eq!(flatten(&json!({"a": {}, "b": []})), "");
    }

    #[test]
    fn object_metadata_lists_keys_and_known_fields() {
        let value = json!({"title": "Pentest", "findings": [], "version": 2});
        let metadata = metadata_for(&value);
        assert_eq!(metadata["json_keys"], json!(["title", "findings", "version"]));
        assert_eq!(metadata["json_structure"], json!("object"));
        assert_eq!(metadata["title"], json!("Pentest"));
        assert_eq!(metadata["version"], json!(2));
        assert!(!metadata.contains_key("author"));
        assert!(!metadata.contains_key("json_array_length"));
    }

    #[test]
    fn array_metadata_has_length() {
        let metadata = metadata_for(&json!([1, 2, 3]));
        assert_eq!(metadata["json_structure"], json!("array"));
        assert_eq!(metadata["json_array_length"], json!(3));
        assert!(!metadata.contains_key("json_keys"));
    }
}
