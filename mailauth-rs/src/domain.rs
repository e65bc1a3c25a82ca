//! Domain name normalization and validation
//!
//! Customers paste domains in every imaginable shape (`https://www.Example.com/`,
//! `example.com:8080`). Everything downstream (record names, DKIM d= tag) needs
//! one canonical lowercase hostname, so normalization happens once at the edge.

use crate::error::{MailAuthError, Result};

/// Normalize a user-supplied domain to a bare lowercase hostname
///
/// Strips the URL scheme, any `www.` prefix, a path or trailing slash, and a
/// port suffix. Idempotent: normalizing an already-normalized domain is a
/// no-op.
pub fn normalize_domain(input: &str) -> String {
    let mut domain = input.trim().to_ascii_lowercase();

    for scheme in ["https://", "http://"] {
        if let Some(rest) = domain.strip_prefix(scheme) {
            domain = rest.to_string();
            break;
        }
    }

    while let Some(rest) = domain.strip_prefix("www.") {
        domain = rest.to_string();
    }

    if let Some(pos) = domain.find('/') {
        domain.truncate(pos);
    }

    if let Some(pos) = domain.find(':') {
        domain.truncate(pos);
    }

    domain
}

/// Validate a normalized hostname (RFC 1035 label rules)
///
/// Labels are `[a-z0-9-]`, no leading/trailing hyphen, at least one dot, and
/// an alphabetic TLD (rejects bare IPs).
pub fn validate_domain(domain: &str) -> Result<()> {
    if domain.is_empty() {
        return Err(MailAuthError::InvalidDomain("domain is empty".to_string()));
    }

    if domain.len() > 253 {
        return Err(MailAuthError::InvalidDomain(format!(
            "domain exceeds 253 characters: {}",
            domain
        )));
    }

    if !domain.contains('.') {
        return Err(MailAuthError::InvalidDomain(format!(
            "domain must contain a dot: {}",
            domain
        )));
    }

    let labels: Vec<&str> = domain.split('.').collect();

    for label in &labels {
        if label.is_empty() {
            return Err(MailAuthError::InvalidDomain(format!(
                "empty label in domain: {}",
                domain
            )));
        }
        if label.len() > 63 {
            return Err(MailAuthError::InvalidDomain(format!(
                "label exceeds 63 characters: {}",
                label
            )));
        }
        if !label
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        {
            return Err(MailAuthError::InvalidDomain(format!(
                "invalid character in label: {}",
                label
            )));
        }
        if label.starts_with('-') || label.ends_with('-') {
            return Err(MailAuthError::InvalidDomain(format!(
                "label cannot start or end with hyphen: {}",
                label
            )));
        }
    }

    // Alphabetic TLD rejects IPs-as-domains
    if let Some(tld) = labels.last() {
        if !tld.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(MailAuthError::InvalidDomain(format!(
                "TLD must be alphabetic: {}",
                tld
            )));
        }
    }

    Ok(())
}

pub fn is_valid_domain(domain: &str) -> bool {
    validate_domain(domain).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_strips_scheme_and_www() {
        assert_eq!(normalize_domain("https://www.Example.com/"), "example.com");
        assert_eq!(normalize_domain("http://example.com"), "example.com");
        assert_eq!(normalize_domain("www.example.com"), "example.com");
    }

    #[test]
    fn test_normalize_strips_port_and_path() {
        assert_eq!(normalize_domain("example.com:8080"), "example.com");
        assert_eq!(normalize_domain("example.com/path/to/page"), "example.com");
        assert_eq!(normalize_domain("  Example.COM  "), "example.com");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let inputs = [
            "https://www.Example.com/",
            "www.www.example.com",
            "example.com:443/x",
            "plain.example.org",
        ];
        for input in inputs {
            let once = normalize_domain(input);
            assert_eq!(normalize_domain(&once), once, "not idempotent for {input}");
        }
    }

    #[test]
    fn test_valid_domains() {
        assert!(is_valid_domain("example.com"));
        assert!(is_valid_domain("sub.example.co.uk"));
        assert!(is_valid_domain("my-brand.example.org"));
        assert!(is_valid_domain("123.example.com"));
    }

    #[test]
    fn test_invalid_domains() {
        assert!(!is_valid_domain(""));
        assert!(!is_valid_domain("not a domain"));
        assert!(!is_valid_domain("a..b.com"));
        assert!(!is_valid_domain("nodot"));
        assert!(!is_valid_domain("-example.com"));
        assert!(!is_valid_domain("example-.com"));
        assert!(!is_valid_domain("192.168.1.1"));
    }

    #[test]
    fn test_label_length_limit() {
        let long_label = "a".repeat(64);
        assert!(!is_valid_domain(&format!("{}.com", long_label)));
        let ok_label = "a".repeat(63);
        assert!(is_valid_domain(&format!("{}.com", ok_label)));
    }
}
