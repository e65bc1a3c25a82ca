//! DKIM signing (RFC 6376)
//!
//! Builds the DKIM-Signature header value from first principles: manual
//! canonicalization, SHA-256 body hash, RSA-PKCS#1-v1.5 signature over the
//! canonicalized headers plus the unsigned signature header itself. No
//! turnkey DKIM library is involved; this is the part worth testing
//! exhaustively.

pub mod canonical;

use crate::error::{MailAuthError, Result};
use crate::keys::parse_private_key;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use canonical::{canonicalize_body, canonicalize_header, Canonicalization};
use rsa::pkcs1v15::Pkcs1v15Sign;
use rsa::pkcs8::DecodePublicKey;
use rsa::{RsaPrivateKey, RsaPublicKey};
use sha2::{Digest, Sha256};
use tracing::debug;

/// Headers signed by default when the caller does not pick their own set
pub const DEFAULT_SIGNED_HEADERS: [&str; 5] = ["from", "to", "subject", "date", "message-id"];

/// DKIM signer for one domain/selector/key triple
pub struct DkimSigner {
    /// d= tag
    domain: String,
    /// s= tag
    selector: String,
    private_key: RsaPrivateKey,
}

impl DkimSigner {
    /// Create a signer from a PEM private key (PKCS#8, PKCS#1 fallback)
    pub fn new(domain: &str, selector: &str, private_key_pem: &str) -> Result<Self> {
        let private_key = parse_private_key(private_key_pem)?;

        debug!(
            "DKIM signer initialized for domain {}, selector {}",
            domain, selector
        );

        Ok(Self {
            domain: domain.to_string(),
            selector: selector.to_string(),
            private_key,
        })
    }

    /// Sign a set of headers and a body, returning the DKIM-Signature value
    ///
    /// `headers` is the ordered list of (name, value) pairs to sign; the h=
    /// tag lists the lowercased names in the same order.
    pub fn sign(
        &self,
        headers: &[(&str, &str)],
        body: &str,
        canonicalization: &Canonicalization,
    ) -> Result<String> {
        self.sign_at(headers, body, canonicalization, chrono::Utc::now().timestamp())
    }

    /// Sign with an explicit t= timestamp (Unix seconds)
    pub fn sign_at(
        &self,
        headers: &[(&str, &str)],
        body: &str,
        canonicalization: &Canonicalization,
        timestamp: i64,
    ) -> Result<String> {
        let canonical_body = canonicalize_body(body, canonicalization.body);
        let body_hash = BASE64.encode(Sha256::digest(canonical_body.as_bytes()));

        let header_names: Vec<String> = headers
            .iter()
            .map(|(name, _)| name.to_ascii_lowercase())
            .collect();

        let unsigned_tag_set = format!(
            "v=1; a=rsa-sha256; c={}; d={}; s={}; t={}; bh={}; h={}; b=",
            canonicalization,
            self.domain,
            self.selector,
            timestamp,
            body_hash,
            header_names.join(":")
        );

        let data = signing_input(headers, &unsigned_tag_set, canonicalization);
        let signature = self.sign_bytes(data.as_bytes())?;

        debug!("Signed {} headers for {}", headers.len(), self.domain);

        Ok(format!("{}{}", unsigned_tag_set, BASE64.encode(signature)))
    }

    /// Sign a complete raw message (headers + blank line + body)
    ///
    /// Selects the default header set from the header block and signs with
    /// relaxed/relaxed. Returns the DKIM-Signature value to attach.
    pub fn sign_message(&self, raw_message: &str) -> Result<String> {
        let (header_block, body) = split_message(raw_message);
        let all_headers = parse_headers(&header_block);

        let mut signed_headers: Vec<(&str, &str)> = Vec::new();
        for wanted in DEFAULT_SIGNED_HEADERS {
            if let Some((name, value)) = all_headers
                .iter()
                .find(|(name, _)| name.eq_ignore_ascii_case(wanted))
            {
                signed_headers.push((name.as_str(), value.as_str()));
            }
        }

        if signed_headers.is_empty() {
            return Err(MailAuthError::Signing(
                "message has none of the signable headers".to_string(),
            ));
        }

        self.sign(&signed_headers, &body, &Canonicalization::default())
    }

    fn sign_bytes(&self, data: &[u8]) -> Result<Vec<u8>> {
        let digest = Sha256::digest(data);
        self.private_key
            .sign(Pkcs1v15Sign::new::<Sha256>(), &digest)
            .map_err(|e| MailAuthError::Signing(e.to_string()))
    }
}

/// The exact byte sequence that gets signed: canonicalized headers joined
/// with CRLF, then the unsigned DKIM-Signature header itself (no trailing
/// CRLF), canonicalized under the header mode
pub fn signing_input(
    headers: &[(&str, &str)],
    unsigned_tag_set: &str,
    canonicalization: &Canonicalization,
) -> String {
    let mut parts: Vec<String> = headers
        .iter()
        .map(|(name, value)| canonicalize_header(name, value, canonicalization.header))
        .collect();

    parts.push(canonicalize_header(
        "DKIM-Signature",
        unsigned_tag_set,
        canonicalization.header,
    ));

    parts.join("\r\n")
}

/// Strip the signature value from a DKIM-Signature value, leaving the tag
/// set that was actually signed (everything up to and including `b=`)
pub fn unsigned_tag_set(header_value: &str) -> String {
    match header_value.rfind("b=") {
        Some(pos) => header_value[..pos + 2].to_string(),
        None => header_value.to_string(),
    }
}

/// Verify an RSA-SHA256 signature against a public key PEM
///
/// Returns `Ok(false)` for a well-formed but non-matching signature; only
/// unparseable inputs are errors.
pub fn verify_signature(public_key_pem: &str, data: &[u8], signature_b64: &str) -> Result<bool> {
    let public_key = RsaPublicKey::from_public_key_pem(public_key_pem)
        .map_err(|e| MailAuthError::InvalidKey(format!("failed to parse public key: {}", e)))?;
    let signature = BASE64
        .decode(signature_b64)
        .map_err(|e| MailAuthError::Signing(format!("invalid base64 signature: {}", e)))?;

    let digest = Sha256::digest(data);
    Ok(public_key
        .verify(Pkcs1v15Sign::new::<Sha256>(), &digest, &signature)
        .is_ok())
}

/// Split a raw message into header block and body at the first blank line
fn split_message(raw: &str) -> (String, String) {
    if let Some(pos) = raw.find("\r\n\r\n") {
        (raw[..pos].to_string(), raw[pos + 4..].to_string())
    } else if let Some(pos) = raw.find("\n\n") {
        (raw[..pos].to_string(), raw[pos + 2..].to_string())
    } else {
        (raw.to_string(), String::new())
    }
}

/// Parse a header block into (name, value) pairs, unfolding continuation
/// lines
fn parse_headers(block: &str) -> Vec<(String, String)> {
    let mut headers: Vec<(String, String)> = Vec::new();

    for line in block.lines() {
        if line.starts_with(' ') || line.starts_with('\t') {
            // Folded continuation of the previous header
            if let Some((_, value)) = headers.last_mut() {
                value.push(' ');
                value.push_str(line.trim());
            }
        } else if let Some((name, value)) = line.split_once(':') {
            headers.push((name.trim().to_string(), value.trim().to_string()));
        }
    }

    headers
}
