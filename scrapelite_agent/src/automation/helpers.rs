//! Helper functions for oracle output parsing and text processing.

/// Characters of a raw oracle reply kept when it is logged.
pub const LOG_PREVIEW_CHARS: usize = 300;

/// Return the body of the first fenced code block in `s`.
///
/// The fence may carry a `json` tag. When `s` contains no complete fence it
/// is returned trimmed, so fenced and unfenced replies parse the same way.
pub fn strip_code_fence(s: &str) -> &str {
    let Some(open) = s.find("```") else {
        return s.trim();
    };

    let mut body_start = open + 3;
    if s[body_start..].starts_with("json") {
        body_start += 4;
    }

    match s[body_start..].find("```") {
        Some(rel_end) => s[body_start..body_start + rel_end].trim(),
        None => s.trim(),
    }
}

/// Keep at most `max_chars` characters from the head of `s`.
///
/// Always cuts on a char boundary.
pub fn truncate_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &s[..byte_idx],
        None => s,
    }
}

/// Short single-line preview of a reply for log output.
pub fn log_preview(s: &str) -> String {
    truncate_chars(s, LOG_PREVIEW_CHARS).replace('\n', " ")
}

/// Collapse all whitespace runs to single spaces and trim.
pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_json_fence() {
        let raw = "```json\n[{\"action\": \"click\", \"index\": 1}]\n```";
        assert_eq!(strip_code_fence(raw), r#"[{"action": "click", "index": 1}]"#);
    }

    #[test]
    fn test_strip_bare_fence_with_prose() {
        let raw = "Here you go:\n```\n{\"a\": 1}\n```\nDone.";
        assert_eq!(strip_code_fence(raw), r#"{"a": 1}"#);
    }

    #[test]
    fn test_no_fence_is_trimmed() {
        assert_eq!(strip_code_fence("  []  \n"), "[]");
    }

    #[test]
    fn test_unclosed_fence_left_alone() {
        assert_eq!(strip_code_fence(" ```json [1] "), "```json [1]");
    }

    #[test]
    fn test_only_first_block_is_used() {
        let raw = "```json\n[1]\n```\n```json\n[2]\n```";
        assert_eq!(strip_code_fence(raw), "[1]");
    }

    #[test]
    fn test_truncate_chars_is_boundary_safe() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("abc", 10), "abc");
        assert_eq!(truncate_chars("日本語テキスト", 3), "日本語");
        assert_eq!(truncate_chars("", 3), "");
    }

    #[test]
    fn test_log_preview() {
        let long = "x".repeat(1000);
        assert_eq!(log_preview(&long).len(), LOG_PREVIEW_CHARS);
        assert_eq!(log_preview("a\nb"), "a b");
    }

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(collapse_whitespace("  Sign \n\t in  "), "Sign in");
        assert_eq!(collapse_whitespace(""), "");
    }
}
