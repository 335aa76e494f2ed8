use konfig_proto::validation::ValidationIssue;

use super::issue;

/// YAML must parse as a document; the parser error doubles as the message.
pub fn check_yaml(content: &[u8]) -> Vec<ValidationIssue> {
    match serde_yaml::from_slice::<serde_yaml::Value>(content) {
        Ok(_) => Vec::new(),
        Err(e) => vec![issue("", "syntax", format!("Invalid YAML: {e}"))],
    }
}
