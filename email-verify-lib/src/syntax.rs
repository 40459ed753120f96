//! Address syntax filtering.
//!
//! A coarse format check, not a full RFC 5322 grammar. Quoted local parts,
//! domain literals and internationalized addresses are rejected on purpose.

use regex::Regex;

lazy_static::lazy_static! {
    static ref EMAIL_PATTERN: Regex =
        Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
            .expect("email pattern is a valid regex");
}

/// Check whether `address` looks like a deliverable email address.
///
/// No trimming or case folding is applied; `" a@b.co"` is rejected.
///
/// # Example
///
/// ```rust
/// use email_verify_lib::is_valid_format;
///
/// assert!(is_valid_format("user.name+tag@example.com"));
/// assert!(!is_valid_format("missing-at.example.com"));
/// ```
pub fn is_valid_format(address: &str) -> bool {
    EMAIL_PATTERN.is_match(address)
}

/// Return the text after the first `@`, or `None` if there is none.
pub fn extract_domain(address: &str) -> Option<&str> {
    match address.split_once('@') {
        Some((_, domain)) if !domain.is_empty() => Some(domain),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_common_addresses() {
        assert!(is_valid_format("simple@example.com"));
        assert!(is_valid_format("very.common@example.com"));
        assert!(is_valid_format("x@example.io"));
        assert!(is_valid_format("first_last%dept+tag-1@mail.sub-domain.example.org"));
        assert!(is_valid_format("USER@EXAMPLE.COM"));
    }

    #[test]
    fn test_rejects_malformed_addresses() {
        assert!(!is_valid_format(""));
        assert!(!is_valid_format("bad-format"));
        assert!(!is_valid_format("@example.com"));
        assert!(!is_valid_format("user@"));
        assert!(!is_valid_format("user@example"));
        assert!(!is_valid_format("user@example.c"));
        assert!(!is_valid_format("user@example.c0m"));
        assert!(!is_valid_format("user name@example.com"));
        assert!(!is_valid_format("user@exa_mple.com"));
    }

    #[test]
    fn test_no_normalization() {
        assert!(!is_valid_format(" user@example.com"));
        assert!(!is_valid_format("user@example.com\n"));
    }

    #[test]
    fn test_accepted_scope_limits() {
        // Valid per RFC 5322 but outside what this filter accepts
        assert!(!is_valid_format("\"quoted\"@example.com"));
        assert!(!is_valid_format("user@[192.168.0.1]"));
        // Loose on dots, also accepted scope
        assert!(is_valid_format("a..b@example.com"));
    }

    #[test]
    fn test_extract_domain() {
        assert_eq!(extract_domain("user@example.com"), Some("example.com"));
        assert_eq!(extract_domain("a@b@c.com"), Some("b@c.com"));
        assert_eq!(extract_domain("no-at-sign"), None);
        assert_eq!(extract_domain("trailing@"), None);
    }
}
