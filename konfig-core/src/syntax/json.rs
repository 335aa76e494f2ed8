use konfig_proto::validation::ValidationIssue;

use super::issue;

/// Shallow JSON well-formedness scan.
///
/// Tracks bracket depth and string/escape state, rejecting trailing commas
/// and unbalanced brackets with line/column positions. Not a parser on
/// purpose: content semantics are the validation service's job.
pub fn check_json(content: &[u8]) -> Vec<ValidationIssue> {
    let mut depth: i32 = 0;
    let mut in_string = false;
    let mut escaped = false;
    let mut line: usize = 1;
    let mut column: usize = 0;

    for (i, &c) in content.iter().enumerate() {
        column += 1;

        if c == b'\n' {
            line += 1;
            column = 0;
            continue;
        }

        if escaped {
            escaped = false;
            continue;
        }

        if c == b'\\' && in_string {
            escaped = true;
            continue;
        }

        if c == b'"' {
            in_string = !in_string;
            continue;
        }

        if in_string {
            continue;
        }

        match c {
            b'{' | b'[' => depth += 1,
            b'}' | b']' => {
                if let Some(&p) = content[..i]
                    .iter()
                    .rev()
                    .find(|p| !p.is_ascii_whitespace())
                {
                    if p == b',' {
                        return vec![issue(
                            "",
                            "syntax",
                            format!(
                                "Trailing comma before '{}' at line {line}, column {column}",
                                c as char
                            ),
                        )];
                    }
                }
                depth -= 1;
                if depth < 0 {
                    return vec![issue(
                        "",
                        "syntax",
                        format!("Unexpected closing bracket at line {line}, column {column}"),
                    )];
                }
            }
            _ => {}
        }
    }

    let mut issues = Vec::new();
    if depth != 0 {
        issues.push(issue(
            "",
            "syntax",
            format!("Unclosed brackets (depth: {depth})"),
        ));
    }
    if in_string {
        issues.push(issue("", "syntax", "Unclosed string"));
    }
    issues
}
