//! DKIM key material: verification tokens, selectors, RSA key pairs
//!
//! The verification token is a security control against false domain-ownership
//! claims, so it always comes from the OS CSPRNG. Selectors only need to be
//! unique within one domain's lifetime; a millisecond timestamp suffix is
//! enough since selectors are namespaced by domain in DNS.

use crate::error::{MailAuthError, Result};
use rand::rngs::OsRng;
use rand::Rng;
use rsa::pkcs8::{DecodePrivateKey, EncodePrivateKey, EncodePublicKey, LineEnding};
use rsa::{RsaPrivateKey, RsaPublicKey};
use tracing::debug;

/// Recommended floor for DKIM keys (RFC 8301)
pub const DEFAULT_KEY_BITS: usize = 2048;

const TOKEN_LENGTH: usize = 32;
const TOKEN_ALPHABET: &[u8] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// Generate a random ownership token (32 alphanumeric chars, CSPRNG)
pub fn generate_verification_token() -> String {
    let mut rng = OsRng;
    (0..TOKEN_LENGTH)
        .map(|_| TOKEN_ALPHABET[rng.gen_range(0..TOKEN_ALPHABET.len())] as char)
        .collect()
}

/// Generate a DKIM selector unique within one domain's lifetime
pub fn generate_dkim_selector() -> String {
    format!("s{}", chrono::Utc::now().timestamp_millis())
}

/// PEM-encoded RSA key pair for DKIM signing
///
/// The private key is sensitive: callers must encrypt it before persisting.
#[derive(Debug, Clone)]
pub struct DkimKeyPair {
    /// PKCS#8 PEM private key
    pub private_key_pem: String,
    /// SPKI PEM public key
    pub public_key_pem: String,
}

impl DkimKeyPair {
    /// Generate a new RSA key pair of the given size
    pub fn generate(bits: usize) -> Result<Self> {
        let mut rng = OsRng;
        let private_key = RsaPrivateKey::new(&mut rng, bits)
            .map_err(|e| MailAuthError::KeyGeneration(e.to_string()))?;
        let public_key = RsaPublicKey::from(&private_key);

        let private_key_pem = private_key
            .to_pkcs8_pem(LineEnding::LF)
            .map_err(|e| MailAuthError::KeyGeneration(e.to_string()))?
            .to_string();
        let public_key_pem = public_key
            .to_public_key_pem(LineEnding::LF)
            .map_err(|e| MailAuthError::KeyGeneration(e.to_string()))?;

        debug!("Generated {}-bit DKIM key pair", bits);

        Ok(Self {
            private_key_pem,
            public_key_pem,
        })
    }

    /// Generate a key pair at the default 2048-bit size
    pub fn generate_default() -> Result<Self> {
        Self::generate(DEFAULT_KEY_BITS)
    }

    /// Public key with PEM armor and newlines stripped, for the DNS p= tag
    ///
    /// DNS TXT records cannot carry PEM headers, only the raw base64.
    pub fn public_key_for_dns(&self) -> String {
        self.public_key_pem
            .lines()
            .filter(|line| !line.starts_with("-----"))
            .collect()
    }
}

/// Parse a PEM private key, accepting PKCS#8 with a PKCS#1 fallback
pub fn parse_private_key(pem: &str) -> Result<RsaPrivateKey> {
    use rsa::pkcs1::DecodeRsaPrivateKey;

    RsaPrivateKey::from_pkcs8_pem(pem)
        .or_else(|_| RsaPrivateKey::from_pkcs1_pem(pem))
        .map_err(|e| MailAuthError::InvalidKey(format!("failed to parse private key: {}", e)))
}
