//! In-process syntactic checks for uploaded documents.
//!
//! Deliberately shallow: a bracket/string scan for JSON and a full parse
//! for YAML. Anything deeper (required fields, ranges, schemas) belongs to
//! the validation service.

mod json;
mod yaml;

pub use json::check_json;
pub use yaml::check_yaml;

#[cfg(test)]
mod json_test;
#[cfg(test)]
mod yaml_test;

//---
use konfig_proto::validation::ValidationIssue;

/// Dispatches on the declared format. An empty format is treated as JSON,
/// matching what the upload path stores.
pub fn check_syntax(
    format: &str,
    content: &[u8],
) -> Vec<ValidationIssue> {
    match format {
        "" | "json" => check_json(content),
        "yaml" | "yml" => check_yaml(content),
        other => vec![issue(
            "format",
            "unsupported",
            format!("Unsupported format '{other}', expected json, yaml or yml"),
        )],
    }
}

pub(crate) fn issue(
    field: &str,
    error_type: &str,
    message: impl Into<String>,
) -> ValidationIssue {
    ValidationIssue {
        field: field.to_string(),
        error_type: error_type.to_string(),
        message: message.into(),
    }
}
