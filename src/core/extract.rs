//! Safe-path extraction from loosely-shaped capability responses.
//!
//! Remote responses may omit any nested field at any depth. Instead of
//! nested conditionals, normalizers walk an explicit path and fall back
//! to a single named default.

use serde_json::Value;

/// One segment of an extraction path
#[derive(Debug, Clone, Copy)]
pub enum Seg<'a> {
    /// Object key
    Key(&'a str),

    /// Array index
    Idx(usize),
}

/// Walk a path into a JSON value, returning `None` as soon as any
/// segment is absent
pub fn pluck<'a>(root: &'a Value, path: &[Seg<'_>]) -> Option<&'a Value> {
    let mut current = root;
    for seg in path {
        current = match seg {
            Seg::Key(key) => current.get(*key)?,
            Seg::Idx(index) => current.get(*index)?,
        };
    }
    Some(current)
}

/// Extract a non-empty string at the given path, or the default.
///
/// An empty string at the path counts as missing, matching the upstream
/// truthiness checks this replaces.
pub fn text_or(root: &Value, path: &[Seg<'_>], default: &str) -> String {
    pluck(root, path)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| default.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_pluck_full_path() {
        let value = json!({
            "candidates": [{"content": {"parts": [{"text": "A hand-carved bowl"}]}}]
        });

        let path = [
            Seg::Key("candidates"),
            Seg::Idx(0),
            Seg::Key("content"),
            Seg::Key("parts"),
            Seg::Idx(0),
            Seg::Key("text"),
        ];

        assert_eq!(
            pluck(&value, &path).and_then(Value::as_str),
            Some("A hand-carved bowl")
        );
    }

    #[test]
    fn test_pluck_stops_at_any_missing_level() {
        let path = [
            Seg::Key("candidates"),
            Seg::Idx(0),
            Seg::Key("content"),
            Seg::Key("parts"),
            Seg::Idx(0),
            Seg::Key("text"),
        ];

        // Missing at every possible depth
        for value in [
            json!({}),
            json!({"candidates": []}),
            json!({"candidates": [{}]}),
            json!({"candidates": [{"content": {}}]}),
            json!({"candidates": [{"content": {"parts": []}}]}),
            json!({"candidates": [{"content": {"parts": [{}]}}]}),
        ] {
            assert!(pluck(&value, &path).is_none());
        }
    }

    #[test]
    fn test_text_or_default() {
        let value = json!({"queryResult": {}});
        let path = [
            Seg::Key("queryResult"),
            Seg::Key("responseMessages"),
            Seg::Idx(0),
            Seg::Key("text"),
            Seg::Key("text"),
            Seg::Idx(0),
        ];

        assert_eq!(
            text_or(&value, &path, "No response from agent"),
            "No response from agent"
        );
    }

    #[test]
    fn test_text_or_empty_string_falls_back() {
        let value = json!({"reply": ""});
        assert_eq!(text_or(&value, &[Seg::Key("reply")], "fallback"), "fallback");
    }

    #[test]
    fn test_text_or_non_string_falls_back() {
        let value = json!({"reply": 7});
        assert_eq!(text_or(&value, &[Seg::Key("reply")], "fallback"), "fallback");
    }
}
