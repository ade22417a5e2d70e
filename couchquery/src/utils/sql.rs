//! Query-language string helpers

use regex::Regex;

/// Translate a LIKE pattern into an anchored regex
///
/// `%` becomes `.*`, `_` becomes `.`, everything else is matched literally.
pub fn like_to_regex(pattern: &str) -> Result<Regex, regex::Error> {
    let mut source = String::from("(?s)^");
    for c in pattern.chars() {
        match c {
            '%' => source.push_str(".*"),
            '_' => source.push('.'),
            c => source.push_str(&regex::escape(&c.to_string())),
        }
    }
    source.push('$');
    Regex::new(&source)
}

/// Match `text` against a LIKE pattern
///
/// `%` matches any run of characters (including none) and `_` matches exactly
/// one character. Matching is case-sensitive.
///
/// # Example
///
/// ```
/// use couchquery::utils::sql::like_matches;
///
/// assert!(like_matches("_sync:rev:abc", "_sync:%").unwrap());
/// assert!(!like_matches("user::1", "_sync:%").unwrap());
/// ```
pub fn like_matches(text: &str, pattern: &str) -> Result<bool, regex::Error> {
    Ok(like_to_regex(pattern)?.is_match(text))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matches(text: &str, pattern: &str) -> bool {
        like_matches(text, pattern).unwrap()
    }

    #[test]
    fn test_like_prefix() {
        assert!(matches("_sync:att:x", "_sync:%"));
        assert!(matches("_sync:", "_sync:%"));
        assert!(!matches("_syn", "_sync:%"));
    }

    #[test]
    fn test_like_underscore_matches_one_char() {
        assert!(matches("cat", "c_t"));
        assert!(!matches("ct", "c_t"));
        assert!(!matches("caat", "c_t"));
    }

    #[test]
    fn test_like_percent_in_middle() {
        assert!(matches("user::42::profile", "user::%::profile"));
        assert!(!matches("user::42::avatar", "user::%::profile"));
    }

    #[test]
    fn test_like_exact_and_empty() {
        assert!(matches("abc", "abc"));
        assert!(!matches("abc", "ABC"));
        assert!(matches("", ""));
        assert!(matches("", "%"));
        assert!(!matches("", "_"));
    }

    #[test]
    fn test_like_regex_metacharacters_are_literal() {
        assert!(matches("a.b(c)", "a.b(c)"));
        assert!(!matches("axb(c)", "a.b(c)"));
        assert!(matches("price $5+", "price $%+"));
    }

    #[test]
    fn test_like_percent_spans_newlines() {
        assert!(matches("_sync:a\nb", "_sync:%"));
        assert_eq!(like_to_regex("a%_").unwrap().as_str(), "(?s)^a.*.$");
    }
}
