use super::*;

#[test]
fn test_well_formed_json_passes() {
    assert!(check_json(b"{\"k\":1}").is_empty());
    assert!(check_json(b"[1, 2, {\"a\": [true, null]}]").is_empty());
    assert!(check_json(b"").is_empty());
}

#[test]
fn test_trailing_comma_rejected() {
    let issues = check_json(b"{\"k\": 1,}");
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].error_type, "syntax");
    assert!(issues[0].message.contains("Trailing comma"));
}

#[test]
fn test_trailing_comma_position_reported() {
    let issues = check_json(b"{\n  \"k\": 1,\n}");
    assert!(issues[0].message.contains("line 3"));
}

#[test]
fn test_unclosed_bracket_rejected() {
    let issues = check_json(b"{\"k\": [1, 2}");
    // Either unbalanced or unclosed depending on shape; this one closes an
    // object while an array is open, then ends at non-zero depth.
    assert!(!issues.is_empty());
}

#[test]
fn test_unexpected_closing_bracket_rejected() {
    let issues = check_json(b"{\"k\": 1}}");
    assert_eq!(issues.len(), 1);
    assert!(issues[0].message.contains("Unexpected closing bracket"));
}

#[test]
fn test_unclosed_string_rejected() {
    let issues = check_json(b"{\"k\": \"oops}");
    assert!(issues.iter().any(|i| i.message.contains("Unclosed string")));
}

#[test]
fn test_brackets_inside_strings_ignored() {
    assert!(check_json(b"{\"k\": \"}{][\"}").is_empty());
}

#[test]
fn test_escaped_quotes_inside_strings() {
    assert!(check_json(b"{\"k\": \"say \\\"hi\\\"\"}").is_empty());
}

#[test]
fn test_comma_inside_string_before_bracket_ok() {
    assert!(check_json(b"{\"k\": \"a,\"}").is_empty());
}
