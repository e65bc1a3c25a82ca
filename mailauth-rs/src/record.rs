//! Domain record data model
//!
//! `DomainRecord` is the unit the engine operates on: created once by the
//! generator, mutated in place by the verifier (only `verified` flags, derived
//! status and timestamps ever change), and read by the signer. Partial updates
//! go through `DomainRecordPatch` so callers cannot apply half a verification
//! result.

use crate::error::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// TTL written into zone-file output
const ZONE_TTL: u32 = 3600;

/// DNS record types used for email authentication
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DnsRecordType {
    Txt,
    Cname,
    Mx,
}

impl std::fmt::Display for DnsRecordType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DnsRecordType::Txt => write!(f, "TXT"),
            DnsRecordType::Cname => write!(f, "CNAME"),
            DnsRecordType::Mx => write!(f, "MX"),
        }
    }
}

/// What a DNS record is for, from the engine's point of view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordPurpose {
    Ownership,
    Spf,
    Dkim,
    Dmarc,
    Mx,
}

impl std::fmt::Display for RecordPurpose {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecordPurpose::Ownership => write!(f, "ownership"),
            RecordPurpose::Spf => write!(f, "spf"),
            RecordPurpose::Dkim => write!(f, "dkim"),
            RecordPurpose::Dmarc => write!(f, "dmarc"),
            RecordPurpose::Mx => write!(f, "mx"),
        }
    }
}

/// Aggregate verification state of a domain
///
/// `Failed` exists for stored-data compatibility; the verifier only ever
/// emits `Pending` or `Verified`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerificationStatus {
    Pending,
    Verified,
    Failed,
}

/// A single DNS record a customer must publish
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DnsRecord {
    pub record_type: DnsRecordType,
    pub name: String,
    pub value: String,
    /// Priority (MX records only)
    pub priority: Option<u16>,
    pub purpose: RecordPurpose,
    pub verified: bool,
}

impl DnsRecord {
    pub fn new(
        record_type: DnsRecordType,
        name: String,
        value: String,
        purpose: RecordPurpose,
    ) -> Self {
        DnsRecord {
            record_type,
            name,
            value,
            priority: None,
            purpose,
            verified: false,
        }
    }

    /// Create MX record with priority
    pub fn mx(name: String, value: String, priority: u16) -> Self {
        DnsRecord {
            record_type: DnsRecordType::Mx,
            name,
            value,
            priority: Some(priority),
            purpose: RecordPurpose::Mx,
            verified: false,
        }
    }

    /// Format as zone file line
    pub fn to_zone_line(&self) -> String {
        match self.record_type {
            DnsRecordType::Mx => {
                format!(
                    "{}\t{}\tIN\t{}\t{} {}",
                    self.name,
                    ZONE_TTL,
                    self.record_type,
                    self.priority.unwrap_or(10),
                    self.value
                )
            }
            DnsRecordType::Txt => {
                format!(
                    "{}\t{}\tIN\t{}\t\"{}\"",
                    self.name, ZONE_TTL, self.record_type, self.value
                )
            }
            _ => {
                format!(
                    "{}\t{}\tIN\t{}\t{}",
                    self.name, ZONE_TTL, self.record_type, self.value
                )
            }
        }
    }
}

/// Everything the engine knows about one sending domain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainRecord {
    pub domain: String,
    pub verification_status: VerificationStatus,
    pub verification_token: String,
    pub dkim_selector: String,
    /// PEM private key; callers encrypt before persisting
    pub dkim_private_key: String,
    pub dkim_public_key: String,
    /// Fixed insertion order: ownership, SPF, DKIM, DMARC, MX
    pub dns_records: Vec<DnsRecord>,
    pub email_enabled: bool,
    pub last_verification_attempt: Option<DateTime<Utc>>,
    pub verified_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl DomainRecord {
    /// Find the record serving a given purpose (exactly one per domain)
    pub fn record_for(&self, purpose: RecordPurpose) -> Option<&DnsRecord> {
        self.dns_records.iter().find(|r| r.purpose == purpose)
    }

    /// Apply a patch produced by the verifier
    ///
    /// The DNS record array is replaced wholesale, never merged.
    pub fn apply(&mut self, patch: DomainRecordPatch) {
        if let Some(status) = patch.verification_status {
            self.verification_status = status;
        }
        if let Some(enabled) = patch.email_enabled {
            self.email_enabled = enabled;
        }
        if let Some(records) = patch.dns_records {
            self.dns_records = records;
        }
        if let Some(attempt) = patch.last_verification_attempt {
            self.last_verification_attempt = Some(attempt);
        }
        if let Some(verified_at) = patch.verified_at {
            self.verified_at = Some(verified_at);
        }
        if let Some(updated_at) = patch.updated_at {
            self.updated_at = updated_at;
        }
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

/// Strongly-typed partial update for a `DomainRecord`
///
/// Named optional fields instead of dynamic dotted-path payloads; `None`
/// means "leave unchanged".
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DomainRecordPatch {
    pub verification_status: Option<VerificationStatus>,
    pub email_enabled: Option<bool>,
    pub dns_records: Option<Vec<DnsRecord>>,
    pub last_verification_attempt: Option<DateTime<Utc>>,
    pub verified_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}
