use thiserror::Error;

#[derive(Error, Debug)]
pub enum MailAuthError {
    #[error("Invalid domain: {0}")]
    InvalidDomain(String),

    #[error("Key generation failed: {0}")]
    KeyGeneration(String),

    #[error("Invalid key: {0}")]
    InvalidKey(String),

    #[error("Unsupported canonicalization: {0}")]
    Canonicalization(String),

    #[error("Signing failed: {0}")]
    Signing(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, MailAuthError>;
