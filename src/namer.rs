//! Span naming from raw query text.

use once_cell::sync::Lazy;
use regex::Regex;

// First maximal run of ASCII letters anywhere in the query (compiled once)
static LEADING_WORD_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new("[A-Za-z]+").unwrap());

/// Derive a stable, low-cardinality span name from a raw query string.
///
/// Returns the first run of alphabetic characters, lower-cased. Query text is
/// highly variable (placeholders, whitespace, formatting), but the leading
/// verb (`SELECT`, `INSERT`, `UPDATE`, ...) is a stable classifier that can
/// be used as a span name without leaking the full statement.
///
/// Returns the empty string when the query contains no alphabetic characters.
///
/// # Example
///
/// ```rust
/// use sql_tracing::query_name;
///
/// assert_eq!(query_name("SELECT * FROM users"), "select");
/// assert_eq!(query_name("\n\tUPDATE users SET name = $1"), "update");
/// ```
pub fn query_name(sql: &str) -> String {
    LEADING_WORD_REGEX
        .find(sql)
        .map(|m| m.as_str().to_ascii_lowercase())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_leading_verb() {
        assert_eq!(query_name("delete FROM"), "delete");
        assert_eq!(query_name("INSERT INTO users (name) VALUES ($1)"), "insert");
    }

    #[test]
    fn test_leading_whitespace_skipped() {
        assert_eq!(query_name(" SELECT * FROM"), "select");
        assert_eq!(query_name("\n\n\tUPDATE users SET\n"), "update");
    }

    #[test]
    fn test_mixed_case_normalized() {
        assert_eq!(query_name("SeLeCt 1"), "select");
    }

    #[test]
    fn test_non_alphabetic_input() {
        assert_eq!(query_name(""), "");
        assert_eq!(query_name("123 + 456"), "");
        assert_eq!(query_name("?? $1 --"), "");
    }

    #[test]
    fn test_deterministic() {
        let q = "  SELECT id FROM orders WHERE id = $1";
        assert_eq!(query_name(q), query_name(q));
    }

    #[test]
    fn test_output_is_lowercase_letters_only() {
        for q in ["SELECT 1", "  WITH cte AS (SELECT 1)", "2 UPDATE", "--"] {
            let name = query_name(q);
            assert!(name.chars().all(|c| c.is_ascii_lowercase()), "{name:?}");
        }
    }
}
