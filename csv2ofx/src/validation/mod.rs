//! Specification document validation.
//!
//! Two layers run before a catalog is used:
//!
//! 1. The raw JSON is checked against the embedded JSON Schema (Draft 7) in
//!    `schemas/spec-catalog.json`, so every shape problem is reported at once.
//! 2. Each typed [`FormatSpec`] is checked for things the schema cannot
//!    express: a usable delimiter, a known encoding, and leaf rules for the
//!    fields that are read as text or dates.

use once_cell::sync::Lazy;
use serde_json::Value;

use crate::parser::{delimiter_byte, resolve_encoding};
use crate::transform::dsl::FormatSpec;

static CATALOG_SCHEMA: Lazy<Value> = Lazy::new(|| {
    serde_json::from_str(include_str!("../../schemas/spec-catalog.json"))
        .expect("embedded catalog schema is valid JSON")
});

/// Validate a JSON value against a JSON schema.
///
/// Returns every violation as a message.
pub fn validate(schema: &Value, data: &Value) -> Result<(), Vec<String>> {
    let validator = jsonschema::draft7::new(schema)
        .map_err(|e| vec![format!("Invalid schema: {}", e)])?;

    let errors: Vec<String> = validator
        .iter_errors(data)
        .map(|e| e.to_string())
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Validate a specification document against the catalog schema.
pub fn validate_document(data: &Value) -> Result<(), Vec<String>> {
    validate(&CATALOG_SCHEMA, data)
}

/// Structural checks on one format.
pub fn validate_format(format: &FormatSpec) -> Result<(), String> {
    delimiter_byte(format.delimiter())?;
    resolve_encoding(format.encoding.as_deref())?;

    for (name, rule) in format.fields.named() {
        if name != "trnamt" && !rule.is_leaf() {
            return Err(format!("field '{}' must read a single column, not a sum", name));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::dsl::{example_format, FieldRule};
    use serde_json::json;

    fn rule() -> Value {
        json!({"field": 0})
    }

    fn fields() -> Value {
        json!({
            "trntype": rule(), "dtposted": rule(), "dtuser": rule(),
            "trnamt": rule(), "memo": rule(), "ftid": rule()
        })
    }

    #[test]
    fn test_valid_document() {
        let doc = json!({"format": [{"name": "a", "comma": ";", "fields": fields()}]});
        assert!(validate_document(&doc).is_ok());
        assert!(validate_document(&json!({})).is_ok());
    }

    #[test]
    fn test_missing_field_rule() {
        let mut f = fields();
        f.as_object_mut().unwrap().remove("memo");
        let doc = json!({"format": [{"name": "a", "fields": f}]});

        let errors = validate_document(&doc).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("memo"));
    }

    #[test]
    fn test_all_violations_reported() {
        let doc = json!({"format": [
            {"name": "a", "skip-header": -1, "fields": fields()},
            {"fields": {"trntype": rule(), "dtposted": rule(), "dtuser": rule(),
                        "trnamt": {"field": "two"}, "memo": rule(), "ftid": rule()}}
        ]});
        let errors = validate_document(&doc).unwrap_err();
        assert_eq!(errors.len(), 3);
        assert!(errors.iter().any(|e| e.contains("minimum")));
        assert!(errors.iter().any(|e| e.contains("\"two\"")));
        assert!(errors.iter().any(|e| e.contains("name")));
    }

    #[test]
    fn test_nested_sum_rules_checked() {
        let mut f = fields();
        f["trnamt"] = json!({"sum": [{"field": 1}, {"sum": [{"field": -2}]}]});
        let doc = json!({"format": [{"name": "a", "fields": f}]});
        assert!(validate_document(&doc).is_err());
    }

    #[test]
    fn test_validate_format() {
        assert!(validate_format(&example_format()).is_ok());

        let mut format = example_format();
        format.fields.memo = FieldRule::sum(vec![FieldRule::leaf(1)]);
        assert!(validate_format(&format).unwrap_err().contains("memo"));

        let mut format = example_format();
        format.comma = "\"".to_string();
        assert!(validate_format(&format).is_err());

        let mut format = example_format();
        format.encoding = Some("no-such-charset".to_string());
        assert!(validate_format(&format).unwrap_err().contains("no-such-charset"));
    }
}
