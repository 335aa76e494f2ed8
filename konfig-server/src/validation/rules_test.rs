use serde_json::json;

use super::rules::apply_rules;
use super::rules::parse_document;
use konfig_core::store::RuleType;
use konfig_core::store::ValidationRule;

fn required(field: &str) -> ValidationRule {
    ValidationRule {
        rule_type: RuleType::Required,
        field: field.into(),
        min_value: None,
        max_value: None,
    }
}

fn range(
    field: &str,
    min: Option<f64>,
    max: Option<f64>,
) -> ValidationRule {
    ValidationRule {
        rule_type: RuleType::Range,
        field: field.into(),
        min_value: min,
        max_value: max,
    }
}

#[test]
fn test_required_field_present_and_missing() {
    let document = json!({"name": "svc", "limits": {"cpu": 2}});

    assert!(apply_rules(&[required("name")], &document).is_empty());
    assert!(apply_rules(&[required("limits.cpu")], &document).is_empty());

    let issues = apply_rules(&[required("limits.memory")], &document);
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].error_type, "required");
    assert_eq!(issues[0].field, "limits.memory");
}

#[test]
fn test_range_bounds() {
    let document = json!({"max_connections": 500});

    assert!(apply_rules(&[range("max_connections", Some(1.0), Some(1000.0))], &document).is_empty());

    let issues = apply_rules(&[range("max_connections", Some(501.0), None)], &document);
    assert_eq!(issues.len(), 1);
    assert!(issues[0].message.contains(">= 501"));

    let issues = apply_rules(&[range("max_connections", None, Some(100.0))], &document);
    assert_eq!(issues.len(), 1);
    assert!(issues[0].message.contains("<= 100"));
}

#[test]
fn test_range_skips_absent_field() {
    let document = json!({});
    assert!(apply_rules(&[range("max_connections", Some(1.0), Some(10.0))], &document).is_empty());
}

#[test]
fn test_range_rejects_non_numeric() {
    let document = json!({"max_connections": "many"});
    let issues = apply_rules(&[range("max_connections", Some(1.0), None)], &document);
    assert_eq!(issues.len(), 1);
    assert!(issues[0].message.contains("must be numeric"));
}

#[test]
fn test_multiple_rules_accumulate() {
    let document = json!({"a": 0});
    let issues = apply_rules(
        &[required("b"), range("a", Some(1.0), None)],
        &document,
    );
    assert_eq!(issues.len(), 2);
}

#[test]
fn test_parse_document_both_formats() {
    assert!(parse_document("json", b"{\"k\": 1}").is_some());
    assert!(parse_document("yaml", b"k: 1\nnested:\n  a: 2\n").is_some());
    assert!(parse_document("json", b"{nope").is_none());
    assert!(parse_document("toml", b"k = 1").is_none());

    let parsed = parse_document("yaml", b"limits:\n  cpu: 4\n").unwrap();
    assert_eq!(parsed["limits"]["cpu"], 4);
}
