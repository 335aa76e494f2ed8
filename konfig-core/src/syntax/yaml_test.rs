use super::*;

#[test]
fn test_well_formed_yaml_passes() {
    assert!(check_yaml(b"key: value\nlist:\n  - 1\n  - 2\n").is_empty());
}

#[test]
fn test_malformed_yaml_rejected() {
    let issues = check_yaml(b"key: [unclosed\n  - broken");
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].error_type, "syntax");
    assert!(issues[0].message.contains("Invalid YAML"));
}

#[test]
fn test_dispatch_by_format() {
    // JSON content declared as yaml still parses (JSON is a YAML subset).
    assert!(check_syntax("yaml", b"{\"k\": 1}").is_empty());
    // Trailing comma passes the YAML parser but not the JSON scan.
    assert!(!check_syntax("json", b"{\"k\": 1,}").is_empty());
    // Unknown formats are rejected outright.
    let issues = check_syntax("toml", b"k = 1");
    assert_eq!(issues[0].error_type, "unsupported");
    // Empty format defaults to JSON.
    assert!(check_syntax("", b"{\"k\": 1}").is_empty());
}
