//! DKIM canonicalization (RFC 6376 section 3.4)
//!
//! Deterministic normalization of header/body bytes before hashing, so that
//! trivial transit modifications (whitespace, line-ending rewrites) do not
//! invalidate a signature.

use crate::error::{MailAuthError, Result};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CanonicalizationMode {
    Simple,
    Relaxed,
}

impl fmt::Display for CanonicalizationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CanonicalizationMode::Simple => write!(f, "simple"),
            CanonicalizationMode::Relaxed => write!(f, "relaxed"),
        }
    }
}

impl FromStr for CanonicalizationMode {
    type Err = MailAuthError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "simple" => Ok(CanonicalizationMode::Simple),
            "relaxed" => Ok(CanonicalizationMode::Relaxed),
            other => Err(MailAuthError::Canonicalization(other.to_string())),
        }
    }
}

/// Header/body canonicalization pair, the c= tag (`<header>/<body>`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Canonicalization {
    pub header: CanonicalizationMode,
    pub body: CanonicalizationMode,
}

impl Default for Canonicalization {
    fn default() -> Self {
        Self {
            header: CanonicalizationMode::Relaxed,
            body: CanonicalizationMode::Relaxed,
        }
    }
}

impl fmt::Display for Canonicalization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.header, self.body)
    }
}

impl FromStr for Canonicalization {
    type Err = MailAuthError;

    fn from_str(s: &str) -> Result<Self> {
        let (header, body) = s
            .split_once('/')
            .ok_or_else(|| MailAuthError::Canonicalization(s.to_string()))?;

        Ok(Self {
            header: header.parse()?,
            body: body.parse()?,
        })
    }
}

fn to_crlf(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\n', "\r\n")
}

fn collapse_whitespace(line: &str) -> String {
    let mut result = String::with_capacity(line.len());
    let mut in_whitespace = false;

    for c in line.chars() {
        if c == ' ' || c == '\t' {
            if !in_whitespace {
                result.push(' ');
            }
            in_whitespace = true;
        } else {
            result.push(c);
            in_whitespace = false;
        }
    }

    result
}

/// Canonicalize a message body
///
/// Simple: normalize line endings to CRLF, otherwise byte-preserving.
/// Relaxed: additionally strip trailing whitespace on each line and collapse
/// interior space/tab runs to a single space.
pub fn canonicalize_body(body: &str, mode: CanonicalizationMode) -> String {
    match mode {
        CanonicalizationMode::Simple => to_crlf(body),
        CanonicalizationMode::Relaxed => {
            let unified = body.replace("\r\n", "\n");
            let lines: Vec<String> = unified
                .split('\n')
                .map(|line| collapse_whitespace(line.trim_end_matches([' ', '\t'])))
                .collect();
            lines.join("\r\n")
        }
    }
}

/// Canonicalize one header field
///
/// Simple: `Name: value` unchanged. Relaxed: lowercase the name, collapse
/// interior whitespace in the value, trim, no space after the colon.
pub fn canonicalize_header(name: &str, value: &str, mode: CanonicalizationMode) -> String {
    match mode {
        CanonicalizationMode::Simple => format!("{}: {}", name, value),
        CanonicalizationMode::Relaxed => format!(
            "{}:{}",
            name.to_ascii_lowercase(),
            collapse_whitespace(value.trim())
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_canonicalization() {
        let canon: Canonicalization = "relaxed/relaxed".parse().unwrap();
        assert_eq!(canon, Canonicalization::default());

        let canon: Canonicalization = "simple/relaxed".parse().unwrap();
        assert_eq!(canon.header, CanonicalizationMode::Simple);
        assert_eq!(canon.body, CanonicalizationMode::Relaxed);

        assert_eq!(canon.to_string(), "simple/relaxed");
    }

    #[test]
    fn test_parse_rejects_unknown_modes() {
        assert!("strict/relaxed".parse::<Canonicalization>().is_err());
        assert!("relaxed".parse::<Canonicalization>().is_err());
        assert!("".parse::<Canonicalization>().is_err());
        assert!("relaxed/relaxed/simple".parse::<Canonicalization>().is_err());
    }

    #[test]
    fn test_body_simple_only_normalizes_line_endings() {
        let body = "Hello  World  \nSecond line\n";
        let canonical = canonicalize_body(body, CanonicalizationMode::Simple);
        assert_eq!(canonical, "Hello  World  \r\nSecond line\r\n");
    }

    #[test]
    fn test_body_simple_preserves_existing_crlf() {
        let body = "line one\r\nline two\n";
        let canonical = canonicalize_body(body, CanonicalizationMode::Simple);
        assert_eq!(canonical, "line one\r\nline two\r\n");
    }

    #[test]
    fn test_body_relaxed_strips_trailing_and_collapses_runs() {
        let body = "Hello   World  \nTabs\t\there\n";
        let canonical = canonicalize_body(body, CanonicalizationMode::Relaxed);
        assert_eq!(canonical, "Hello World\r\nTabs here\r\n");
    }

    #[test]
    fn test_body_relaxed_equivalence_of_trailing_spaces() {
        let with_spaces = "line one   \nline two\n";
        let without = "line one\nline two\n";
        assert_eq!(
            canonicalize_body(with_spaces, CanonicalizationMode::Relaxed),
            canonicalize_body(without, CanonicalizationMode::Relaxed)
        );
        assert_ne!(
            canonicalize_body(with_spaces, CanonicalizationMode::Simple),
            canonicalize_body(without, CanonicalizationMode::Simple)
        );
    }

    #[test]
    fn test_header_simple_is_unchanged() {
        let canonical =
            canonicalize_header("Subject", "Hello  World", CanonicalizationMode::Simple);
        assert_eq!(canonical, "Subject: Hello  World");
    }

    #[test]
    fn test_header_relaxed_lowercases_and_collapses() {
        let canonical =
            canonicalize_header("Subject", "  Hello \t World  ", CanonicalizationMode::Relaxed);
        assert_eq!(canonical, "subject:Hello World");
    }
}
