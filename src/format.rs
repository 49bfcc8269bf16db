//! Syntax-checking helpers.
//!
//! These never fault: a value that does not parse is simply reported as `false`.

use url::Url;

/// Check that a string is an absolute URL.
pub fn is_valid_url(s: &str) -> bool {
    Url::parse(s).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_absolute_urls() {
        assert!(is_valid_url("https://example.com/path?q=1"));
        assert!(is_valid_url("mailto:someone@example.com"));
    }

    #[test]
    fn rejects_relative_and_garbage() {
        assert!(!is_valid_url("example.com"));
        assert!(!is_valid_url("/relative/path"));
        assert!(!is_valid_url(""));
        assert!(!is_valid_url("http://exa mple.com"));
    }
}
