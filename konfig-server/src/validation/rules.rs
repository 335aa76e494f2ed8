//! Applies stored validation rules to a parsed document.
//!
//! Rules operate on a real parse tree, never on substring scans. Fields
//! are addressed by dotted path (`limits.max_connections`).

use serde_json::Value;

use konfig_core::store::RuleType;
use konfig_core::store::ValidationRule;
use konfig_proto::validation::ValidationIssue;

/// Parses either supported format into one tree. JSON is a YAML subset,
/// so the YAML parser covers both when the declared format is yaml.
pub fn parse_document(
    format: &str,
    content: &[u8],
) -> Option<Value> {
    match format {
        "" | "json" => serde_json::from_slice(content).ok(),
        "yaml" | "yml" => serde_yaml_to_json(content),
        _ => None,
    }
}

fn serde_yaml_to_json(content: &[u8]) -> Option<Value> {
    serde_yaml::from_slice::<Value>(content).ok()
}

fn lookup<'a>(
    value: &'a Value,
    dotted_path: &str,
) -> Option<&'a Value> {
    let mut current = value;
    for segment in dotted_path.split('.') {
        current = current.get(segment)?;
    }
    Some(current)
}

/// Runs every rule against the document, returning one issue per
/// violation.
pub fn apply_rules(
    rules: &[ValidationRule],
    document: &Value,
) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();

    for rule in rules {
        match rule.rule_type {
            RuleType::Required => {
                if lookup(document, &rule.field).is_none() {
                    issues.push(issue(
                        &rule.field,
                        "required",
                        format!("Required field '{}' is missing", rule.field),
                    ));
                }
            }
            RuleType::Range => {
                // Absence is the required rule's business; a present
                // non-numeric value is a range violation.
                let Some(found) = lookup(document, &rule.field) else {
                    continue;
                };
                let Some(number) = found.as_f64() else {
                    issues.push(issue(
                        &rule.field,
                        "range",
                        format!("Field '{}' must be numeric", rule.field),
                    ));
                    continue;
                };
                if let Some(min) = rule.min_value {
                    if number < min {
                        issues.push(issue(
                            &rule.field,
                            "range",
                            format!("Field '{}' must be >= {min}, got {number}", rule.field),
                        ));
                        continue;
                    }
                }
                if let Some(max) = rule.max_value {
                    if number > max {
                        issues.push(issue(
                            &rule.field,
                            "range",
                            format!("Field '{}' must be <= {max}, got {number}", rule.field),
                        ));
                    }
                }
            }
        }
    }

    issues
}

fn issue(
    field: &str,
    error_type: &str,
    message: String,
) -> ValidationIssue {
    ValidationIssue {
        field: field.to_string(),
        error_type: error_type.to_string(),
        message,
    }
}
