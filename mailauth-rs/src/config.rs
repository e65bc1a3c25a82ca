use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EngineConfig {
    pub records: RecordConfig,
    pub dns: DnsConfig,
}

/// Values baked into the generated DNS record set
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RecordConfig {
    /// Host included in the SPF policy (include:<spf_include>)
    pub spf_include: String,
    /// Prefix of the mail exchange host (MX points at <prefix>.<domain>)
    pub mail_host_prefix: String,
    pub mx_priority: u16,
    /// Mailbox receiving DMARC aggregate/forensic reports
    pub dmarc_mailbox: String,
    /// Label of the ownership TXT record (<prefix>.<domain>)
    pub ownership_prefix: String,
    pub dkim_key_bits: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DnsConfig {
    pub timeout_secs: u64,
    pub attempts: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            records: RecordConfig {
                spf_include: "_spf.google.com".to_string(),
                mail_host_prefix: "mail".to_string(),
                mx_priority: 10,
                dmarc_mailbox: "dmarc".to_string(),
                ownership_prefix: "_verification".to_string(),
                dkim_key_bits: 2048,
            },
            dns: DnsConfig {
                timeout_secs: 5,
                attempts: 2,
            },
        }
    }
}

impl EngineConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| crate::error::MailAuthError::Config(e.to_string()))?;

        toml::from_str(&content)
            .map_err(|e| crate::error::MailAuthError::Config(e.to_string()))
    }
}
