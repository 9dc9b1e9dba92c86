//! Dot-path resolution against result records

use super::Value;

/// Identifier field present on every platform record
pub const ID_FIELD: &str = "Id";

/// Resolve a dot-separated field path from a result record
///
/// For simple paths like "Name", extracts record["Name"]
/// For relationship paths like "vlocity_cmt__ProductSpecId__r.Name", extracts
/// record["vlocity_cmt__ProductSpecId__r"]["Name"]. A flattened row that
/// already carries the full dotted key is matched first.
///
/// Resolution fails closed: any missing or null segment yields `Value::Null`.
pub fn resolve_path(record: &serde_json::Value, path: &str) -> Value {
    if path.is_empty() {
        return Value::Null;
    }

    if path.contains('.') {
        if let Some(val) = record.get(path) {
            return Value::from_json(val);
        }
    }

    let mut current = record;
    for segment in path.split('.') {
        if current.is_null() {
            return Value::Null;
        }

        // Try exact match first
        if let Some(val) = current.get(segment) {
            current = val;
            continue;
        }

        // Field names are case-insensitive on the platform; configs may not
        // match the casing the API returns
        if let Some(val) = find_case_insensitive(current, segment) {
            current = val;
            continue;
        }

        return Value::Null;
    }

    Value::from_json(current)
}

/// Identifier of a record, if it has one
pub fn record_id(record: &serde_json::Value) -> Option<&str> {
    record
        .get(ID_FIELD)
        .and_then(|v| v.as_str())
        .filter(|id| !id.is_empty())
}

/// Find a key in a JSON object using case-insensitive matching
fn find_case_insensitive<'a>(obj: &'a serde_json::Value, key: &str) -> Option<&'a serde_json::Value> {
    let obj = obj.as_object()?;
    let key_lower = key.to_lowercase();
    for (k, v) in obj.iter() {
        if k.to_lowercase() == key_lower {
            return Some(v);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_resolve_simple_path() {
        let record = json!({
            "Name": "Mobile Plan",
            "vlocity_cmt__Sequence__c": 10
        });

        assert_eq!(resolve_path(&record, "Name"), Value::String("Mobile Plan".into()));
        assert_eq!(resolve_path(&record, "vlocity_cmt__Sequence__c"), Value::Int(10));
    }

    #[test]
    fn test_resolve_missing_field() {
        let record = json!({"Name": "Mobile Plan"});
        assert_eq!(resolve_path(&record, "Missing__c"), Value::Null);
        assert_eq!(resolve_path(&record, ""), Value::Null);
    }

    #[test]
    fn test_resolve_relationship_path() {
        let record = json!({
            "Id": "a0P1",
            "vlocity_cmt__ProductSpecId__r": {
                "Name": "Spec",
                "vlocity_cmt__PricingVariableId__c": "a1V9"
            }
        });

        assert_eq!(
            resolve_path(&record, "vlocity_cmt__ProductSpecId__r.Name"),
            Value::String("Spec".into())
        );
    }

    #[test]
    fn test_resolve_null_relationship() {
        let record = json!({
            "Id": "a0P1",
            "vlocity_cmt__PricingElementId__r": null
        });

        let value = resolve_path(
            &record,
            "vlocity_cmt__PricingElementId__r.vlocity_cmt__PricingVariableId__c",
        );
        assert_eq!(value, Value::Null);
    }

    #[test]
    fn test_resolve_missing_at_any_level() {
        let record = json!({
            "Parent__r": {
                "Name": "x"
            }
        });

        assert_eq!(resolve_path(&record, "Parent__r.Other__r.Name"), Value::Null);
        assert_eq!(resolve_path(&record, "Other__r.Name"), Value::Null);
    }

    #[test]
    fn test_resolve_flattened_key() {
        let record = json!({
            "vlocity_cmt__ChildProductId__r.Name": "Child"
        });

        assert_eq!(
            resolve_path(&record, "vlocity_cmt__ChildProductId__r.Name"),
            Value::String("Child".into())
        );
    }

    #[test]
    fn test_resolve_case_insensitive() {
        let record = json!({"Name": "Plan"});
        assert_eq!(resolve_path(&record, "name"), Value::String("Plan".into()));
    }

    #[test]
    fn test_record_id() {
        assert_eq!(record_id(&json!({"Id": "01t1"})), Some("01t1"));
        assert_eq!(record_id(&json!({"Id": ""})), None);
        assert_eq!(record_id(&json!({"Id": null})), None);
        assert_eq!(record_id(&json!({"expr0": 3})), None);
    }
}
