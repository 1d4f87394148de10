//! Locating JSON inside prose.
//!
//! Models in text modes often wrap their JSON in commentary. The scanners
//! here find the payload: [`find_json_span`] balance-matches braces while
//! respecting string literals, and [`fenced_block`] pulls the body out of a
//! markdown code fence.

/// Find the first balanced JSON object or array in `text`.
///
/// Returns the exact span, or `None` when no opening brace or bracket is
/// present. An opener without a matching closer yields the unterminated
/// tail, which the partial decoder can still repair.
#[must_use]
pub fn find_json_span(text: &str) -> Option<&str> {
    let start = text.find(['{', '['])?;
    let bytes = text.as_bytes();
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, &b) in bytes.iter().enumerate().skip(start) {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'{' | b'[' => depth += 1,
            b'}' | b']' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(&text[start..=i]);
                }
            }
            _ => {}
        }
    }
    // unterminated: hand back everything from the opener
    Some(&text[start..])
}

/// Extract the body of the first markdown code fence.
///
/// A ```json fence is preferred over an unlabeled one. An unterminated
/// fence yields the body seen so far, which keeps streaming extraction
/// working while the model is mid-answer.
#[must_use]
pub fn fenced_block(text: &str) -> Option<&str> {
    fence_body(text, "```json").or_else(|| fence_body(text, "```"))
}

fn fence_body<'a>(text: &'a str, opener: &str) -> Option<&'a str> {
    let fence_at = text.find(opener)?;
    let after_opener = &text[fence_at + opener.len()..];
    // the opener must be followed by a newline, otherwise "```json" would
    // also match the bare "```" opener of a differently-labeled fence
    let body_start = after_opener.find('\n')? + 1;
    if opener == "```" {
        let label = after_opener[..body_start - 1].trim();
        if !label.is_empty() && label != "json" {
            return None;
        }
    }
    let body = &after_opener[body_start..];
    match body.find("```") {
        Some(end) => Some(body[..end].trim()),
        None => Some(body.trim_start()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_span_in_prose() {
        let text = r#"Sure! Here is the data: {"name": "Ada", "age": 36}. Let me know!"#;
        assert_eq!(find_json_span(text), Some(r#"{"name": "Ada", "age": 36}"#));
    }

    #[test]
    fn test_span_respects_braces_inside_strings() {
        let text = r#"{"note": "use {braces} carefully"} trailing"#;
        assert_eq!(
            find_json_span(text),
            Some(r#"{"note": "use {braces} carefully"}"#)
        );
    }

    #[test]
    fn test_span_nested() {
        let text = r#"{"a": {"b": [1, 2]}}"#;
        assert_eq!(find_json_span(text), Some(text));
    }

    #[test]
    fn test_unterminated_span_returns_tail() {
        let text = r#"Answer: {"a": {"b": 1"#;
        assert_eq!(find_json_span(text), Some(r#"{"a": {"b": 1"#));
    }

    #[test]
    fn test_no_json_at_all() {
        assert_eq!(find_json_span("I cannot answer that."), None);
    }

    #[test]
    fn test_array_span() {
        let text = r#"items follow: [1, 2, 3] done"#;
        assert_eq!(find_json_span(text), Some("[1, 2, 3]"));
    }

    #[test]
    fn test_labeled_fence() {
        let text = "Here you go:\n```json\n{\"a\": 1}\n```\nAnything else?";
        assert_eq!(fenced_block(text), Some("{\"a\": 1}"));
    }

    #[test]
    fn test_unlabeled_fence() {
        let text = "```\n{\"a\": 1}\n```";
        assert_eq!(fenced_block(text), Some("{\"a\": 1}"));
    }

    #[test]
    fn test_unterminated_fence_yields_partial_body() {
        let text = "```json\n{\"a\": 1, \"b\"";
        assert_eq!(fenced_block(text), Some("{\"a\": 1, \"b\""));
    }

    #[test]
    fn test_wrong_language_fence_ignored() {
        let text = "```python\nprint('hi')\n```";
        assert_eq!(fenced_block(text), None);
    }

    #[test]
    fn test_no_fence() {
        assert_eq!(fenced_block("just prose"), None);
    }
}
