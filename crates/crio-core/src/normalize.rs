//! Reshaping of successful controller responses

use serde_json::{Map, Value};
use tracing::trace;

use crate::command::Command;
use crate::error::{CrioError, Result};
use crate::types::{CurrentData, TIMESTAMP_TAG};

/// Top-level key of the current-data response
pub const CURRENT_DATA_KEY: &str = "CurrentData";

/// Split a `CurrentData` response into value and unit maps.
///
/// Expected shape:
///
/// ```text
/// {"CurrentData": {
///     "<tag>": {"Value": ..., "Unit": ...},
///     ...
///     "cRIO Timestamp": {"Value": ...}
/// }}
/// ```
///
/// The timestamp's `Value` is placed in the *units* map under
/// [`TIMESTAMP_TAG`], matching what the firmware tooling has always produced.
pub fn normalize_current_data(body: &Value) -> Result<CurrentData> {
    let entries = body
        .get(CURRENT_DATA_KEY)
        .ok_or_else(|| CrioError::malformed(format!("missing top-level '{CURRENT_DATA_KEY}' key")))?
        .as_object()
        .ok_or_else(|| CrioError::malformed(format!("'{CURRENT_DATA_KEY}' is not an object")))?;

    let mut data = CurrentData::default();
    for (tag, entry) in entries {
        if tag == TIMESTAMP_TAG {
            continue;
        }
        let entry = entry
            .as_object()
            .ok_or_else(|| CrioError::malformed(format!("tag '{tag}' is not an object")))?;
        data.values.insert(tag.clone(), field(entry, tag, "Value")?);
        data.units.insert(tag.clone(), field(entry, tag, "Unit")?);
    }

    let timestamp = entries
        .get(TIMESTAMP_TAG)
        .and_then(Value::as_object)
        .ok_or_else(|| CrioError::malformed(format!("missing '{TIMESTAMP_TAG}' entry")))?;
    data.units
        .insert(TIMESTAMP_TAG.to_string(), field(timestamp, TIMESTAMP_TAG, "Value")?);

    trace!(tags = data.len(), "normalized current data");
    Ok(data)
}

/// Alarm and system information are passed through as the parsed object.
pub fn normalize_object(command: Command, body: Value) -> Result<Map<String, Value>> {
    match body {
        Value::Object(map) => Ok(map),
        other => Err(CrioError::malformed(format!(
            "{command} response is not a JSON object (got {})",
            json_type(&other)
        ))),
    }
}

fn field(entry: &Map<String, Value>, tag: &str, name: &str) -> Result<Value> {
    entry
        .get(name)
        .cloned()
        .ok_or_else(|| CrioError::malformed(format!("tag '{tag}' has no '{name}' field")))
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_normalize_single_tag() {
        let body = json!({
            "CurrentData": {
                "T1": {"Value": 1, "Unit": "degC"},
                "cRIO Timestamp": {"Value": "2024-01-01T00:00:00"}
            }
        });

        let data = normalize_current_data(&body).unwrap();

        assert_eq!(serde_json::to_value(&data.values).unwrap(), json!({"T1": 1}));
        assert_eq!(
            serde_json::to_value(&data.units).unwrap(),
            json!({"T1": "degC", "cRIO Timestamp": "2024-01-01T00:00:00"})
        );
    }

    #[test]
    fn test_value_and_unit_keys_match_except_timestamp() {
        let body = json!({
            "CurrentData": {
                "FIC-101": {"Value": 12.5, "Unit": "kg/h"},
                "PI-201": {"Value": 1.013, "Unit": "bar"},
                "XV-301": {"Value": true, "Unit": ""},
                "cRIO Timestamp": {"Value": 3786825600.0}
            }
        });

        let data = normalize_current_data(&body).unwrap();
        let mut unit_tags: Vec<&String> = data.units.keys().collect();
        unit_tags.retain(|t| *t != TIMESTAMP_TAG);
        let value_tags: Vec<&String> = data.values.keys().collect();

        assert_eq!(value_tags, unit_tags);
        assert_eq!(data.len(), 3);
        assert_eq!(data.timestamp(), Some(&json!(3786825600.0)));
        assert_eq!(data.value("XV-301"), Some(&json!(true)));
    }

    #[test]
    fn test_missing_current_data_key() {
        let err = normalize_current_data(&json!({"Data": {}})).unwrap_err();
        assert!(err.is_contract_violation());
        assert!(err.to_string().contains("CurrentData"));
    }

    #[test]
    fn test_missing_unit() {
        let body = json!({
            "CurrentData": {
                "T1": {"Value": 1},
                "cRIO Timestamp": {"Value": "t"}
            }
        });
        let err = normalize_current_data(&body).unwrap_err();
        assert!(matches!(err, CrioError::MalformedPayload { ref context } if context.contains("Unit")));
    }

    #[test]
    fn test_missing_value() {
        let body = json!({
            "CurrentData": {
                "T1": {"Unit": "degC"},
                "cRIO Timestamp": {"Value": "t"}
            }
        });
        assert!(normalize_current_data(&body).unwrap_err().is_contract_violation());
    }

    #[test]
    fn test_missing_timestamp() {
        let body = json!({"CurrentData": {"T1": {"Value": 1, "Unit": "degC"}}});
        let err = normalize_current_data(&body).unwrap_err();
        assert!(err.to_string().contains(TIMESTAMP_TAG));
    }

    #[test]
    fn test_timestamp_without_value() {
        let body = json!({
            "CurrentData": {
                "T1": {"Value": 1, "Unit": "degC"},
                "cRIO Timestamp": {"Unit": ""}
            }
        });
        let err = normalize_current_data(&body).unwrap_err();
        assert!(err.is_contract_violation());
        assert!(err.to_string().contains("'cRIO Timestamp' has no 'Value' field"));
    }

    #[test]
    fn test_timestamp_only() {
        let body = json!({"CurrentData": {"cRIO Timestamp": {"Value": "t"}}});
        let data = normalize_current_data(&body).unwrap();
        assert!(data.is_empty());
        assert_eq!(data.units.len(), 1);
    }

    #[test]
    fn test_normalize_object_is_identity() {
        let body = json!({"Alarms": [{"Tag": "TI-101", "Active": true}]});
        let map = normalize_object(Command::GetAlarmInformation, body.clone()).unwrap();
        assert_eq!(Value::Object(map), body);
    }

    #[test]
    fn test_normalize_object_rejects_arrays() {
        let err = normalize_object(Command::GetSystemInformation, json!([1, 2])).unwrap_err();
        assert!(err.is_contract_violation());
        assert!(err.to_string().contains("array"));
    }
}
