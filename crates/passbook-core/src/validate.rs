//! Input validation for emails and domain names.

use regex::Regex;
use std::sync::LazyLock;

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap());

static DOMAIN_NAME_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").unwrap());

/// Whether `email` matches the `local@domain.tld` pattern.
pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

/// Whether `name` is a valid domain (tenant) name.
pub fn is_valid_domain_name(name: &str) -> bool {
    DOMAIN_NAME_RE.is_match(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_emails() {
        assert!(is_valid_email("a@b.com"));
        assert!(is_valid_email("first.last+tag@sub.example.org"));
    }

    #[test]
    fn rejects_malformed_emails() {
        assert!(!is_valid_email("no-at-sign.com"));
        assert!(!is_valid_email("no-tld@host"));
        assert!(!is_valid_email("spaces in@local.part"));
        assert!(!is_valid_email("two@@signs.com"));
        assert!(!is_valid_email(""));
    }

    #[test]
    fn accepts_valid_domain_names() {
        assert!(is_valid_domain_name("shop"));
        assert!(is_valid_domain_name("Team_Manga-2"));
    }

    #[test]
    fn rejects_invalid_domain_names() {
        assert!(!is_valid_domain_name(""));
        assert!(!is_valid_domain_name("has space"));
        assert!(!is_valid_domain_name("slash/name"));
        assert!(!is_valid_domain_name("dot.name"));
    }
}
