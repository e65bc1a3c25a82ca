//! Live DNS verification of a domain's published records
//!
//! A stateless reconciliation pass: every call re-resolves all five records,
//! recomputes each `verified` flag from scratch and derives the aggregate
//! status. Lookup failures mark a single record unverified and never abort
//! the batch, so the caller always gets a best-effort result telling the
//! customer exactly which records still need fixing.

pub mod resolver;

use crate::record::{
    DnsRecord, DnsRecordType, DomainRecord, DomainRecordPatch, RecordPurpose, VerificationStatus,
};
use chrono::Utc;
use futures::future::join_all;
use resolver::DnsResolver;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Outcome of checking one DNS record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordCheck {
    pub purpose: RecordPurpose,
    pub name: String,
    pub verified: bool,
    /// Why the record is unverified, when known
    pub detail: Option<String>,
}

/// Result of one verification pass over a domain
#[derive(Debug, Clone)]
pub struct VerificationReport {
    pub verification_status: VerificationStatus,
    pub email_enabled: bool,
    pub checks: Vec<RecordCheck>,
    /// Applied atomically by the caller; replaces `dns_records` wholesale
    pub patch: DomainRecordPatch,
}

pub struct DomainVerifier<R: DnsResolver> {
    resolver: R,
}

impl<R: DnsResolver> DomainVerifier<R> {
    pub fn new(resolver: R) -> Self {
        Self { resolver }
    }

    /// Verify every DNS record of a domain and derive aggregate status
    ///
    /// Lookups for the five records run concurrently and are joined before
    /// aggregation; nothing partial is ever observable. Idempotent: the same
    /// DNS state yields the same report.
    pub async fn verify(&self, record: &DomainRecord) -> VerificationReport {
        let checks = join_all(
            record
                .dns_records
                .iter()
                .map(|dns_record| self.check_record(dns_record)),
        )
        .await;

        let mut updated_records = record.dns_records.clone();
        for (dns_record, check) in updated_records.iter_mut().zip(&checks) {
            dns_record.verified = check.verified;
        }

        let ownership_verified = checks
            .iter()
            .any(|c| c.purpose == RecordPurpose::Ownership && c.verified);

        let email_records_verified = checks
            .iter()
            .filter(|c| {
                matches!(
                    c.purpose,
                    RecordPurpose::Spf | RecordPurpose::Dkim | RecordPurpose::Dmarc
                )
            })
            .all(|c| c.verified);

        // Ownership alone gates status; email additionally needs SPF, DKIM
        // and DMARC. A regression flips email_enabled back off.
        let verification_status = if ownership_verified {
            VerificationStatus::Verified
        } else {
            VerificationStatus::Pending
        };
        let email_enabled = ownership_verified && email_records_verified;

        let now = Utc::now();
        let newly_verified =
            verification_status == VerificationStatus::Verified && record.verified_at.is_none();

        info!(
            "Verification of {}: status={:?}, email_enabled={}",
            record.domain, verification_status, email_enabled
        );

        VerificationReport {
            verification_status,
            email_enabled,
            checks,
            patch: DomainRecordPatch {
                verification_status: Some(verification_status),
                email_enabled: Some(email_enabled),
                dns_records: Some(updated_records),
                last_verification_attempt: Some(now),
                verified_at: if newly_verified { Some(now) } else { None },
                updated_at: Some(now),
            },
        }
    }

    async fn check_record(&self, record: &DnsRecord) -> RecordCheck {
        let outcome = match record.record_type {
            DnsRecordType::Txt => self.check_txt(record).await,
            DnsRecordType::Mx => self.check_mx(record).await,
            DnsRecordType::Cname => self.check_cname(record).await,
        };

        match outcome {
            Ok(verified) => {
                debug!(
                    "Record {} ({}) verified={}",
                    record.name, record.purpose, verified
                );
                RecordCheck {
                    purpose: record.purpose,
                    name: record.name.clone(),
                    verified,
                    detail: if verified {
                        None
                    } else {
                        Some("resolved value does not match".to_string())
                    },
                }
            }
            Err(error) => {
                warn!("Lookup failed for {} ({}): {}", record.name, record.purpose, error);
                RecordCheck {
                    purpose: record.purpose,
                    name: record.name.clone(),
                    verified: false,
                    detail: Some(error.to_string()),
                }
            }
        }
    }

    async fn check_txt(&self, record: &DnsRecord) -> Result<bool, resolver::LookupError> {
        let values = self.resolver.lookup_txt(&record.name).await?;

        // Asymmetric on purpose: registrars wrap/quote values and some
        // providers append metadata, so either side may contain the other
        Ok(values
            .iter()
            .any(|resolved| record.value.contains(resolved) || resolved.contains(&record.value)))
    }

    async fn check_mx(&self, record: &DnsRecord) -> Result<bool, resolver::LookupError> {
        let hosts = self.resolver.lookup_mx(&record.name).await?;
        let expected = normalize_host(&record.value);

        Ok(hosts.iter().any(|host| normalize_host(host) == expected))
    }

    async fn check_cname(&self, record: &DnsRecord) -> Result<bool, resolver::LookupError> {
        let targets = self.resolver.lookup_cname(&record.name).await?;
        let expected = normalize_host(&record.value);

        Ok(targets.iter().any(|target| normalize_host(target) == expected))
    }
}

fn normalize_host(host: &str) -> String {
    host.trim_end_matches('.').to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::resolver::{LookupError, StaticResolver};
    use super::*;
    use crate::config::EngineConfig;
    use crate::generator::generate_dns_records;

    const TOKEN: &str = "tok1234567890tok1234567890tok123";
    const SELECTOR: &str = "s1700000000000";

    fn sample_domain_record() -> DomainRecord {
        DomainRecord {
            domain: "example.com".to_string(),
            verification_status: VerificationStatus::Pending,
            verification_token: TOKEN.to_string(),
            dkim_selector: SELECTOR.to_string(),
            dkim_private_key: "PRIVATE".to_string(),
            dkim_public_key: "PUBLIC".to_string(),
            dns_records: generate_dns_records(
                "example.com",
                TOKEN,
                SELECTOR,
                "MIGfMA0GCS",
                &EngineConfig::default(),
            ),
            email_enabled: false,
            last_verification_attempt: None,
            verified_at: None,
            updated_at: Utc::now(),
        }
    }

    fn all_matching_resolver(record: &DomainRecord) -> StaticResolver {
        let mut resolver = StaticResolver::new();
        for dns_record in &record.dns_records {
            resolver = match dns_record.record_type {
                DnsRecordType::Txt => {
                    resolver.with_txt(&dns_record.name, &[dns_record.value.as_str()])
                }
                DnsRecordType::Mx => {
                    resolver.with_mx(&dns_record.name, &[dns_record.value.as_str()])
                }
                DnsRecordType::Cname => {
                    resolver.with_cname(&dns_record.name, &[dns_record.value.as_str()])
                }
            };
        }
        resolver
    }

    #[tokio::test]
    async fn test_all_records_pass() {
        let record = sample_domain_record();
        let verifier = DomainVerifier::new(all_matching_resolver(&record));

        let report = verifier.verify(&record).await;

        assert_eq!(report.verification_status, VerificationStatus::Verified);
        assert!(report.email_enabled);
        assert!(report.checks.iter().all(|c| c.verified));
        assert!(report
            .patch
            .dns_records
            .as_ref()
            .unwrap()
            .iter()
            .all(|r| r.verified));
        assert!(report.patch.verified_at.is_some());
    }

    #[tokio::test]
    async fn test_ownership_alone_gates_status_not_email() {
        let record = sample_domain_record();
        // Only the ownership TXT resolves; SPF lookup times out
        let resolver = StaticResolver::new()
            .with_txt(
                "_verification.example.com",
                &[&format!("verification-token={}", TOKEN)],
            )
            .with_txt_failure("example.com", LookupError::Timeout);

        let verifier = DomainVerifier::new(resolver);
        let report = verifier.verify(&record).await;

        assert_eq!(report.verification_status, VerificationStatus::Verified);
        assert!(!report.email_enabled);
    }

    #[tokio::test]
    async fn test_lookup_failure_does_not_abort_other_records() {
        let record = sample_domain_record();
        let mut resolver = all_matching_resolver(&record);
        // DKIM lookup blows up; the other four must still be computed
        let dkim_name = record.record_for(RecordPurpose::Dkim).unwrap().name.clone();
        resolver = resolver
            .with_txt_failure(&dkim_name, LookupError::Resolver("SERVFAIL".to_string()));

        let verifier = DomainVerifier::new(resolver);
        let report = verifier.verify(&record).await;

        let verified_count = report.checks.iter().filter(|c| c.verified).count();
        assert_eq!(verified_count, 4);

        let dkim_check = report
            .checks
            .iter()
            .find(|c| c.purpose == RecordPurpose::Dkim)
            .unwrap();
        assert!(!dkim_check.verified);
        assert!(dkim_check.detail.as_ref().unwrap().contains("SERVFAIL"));

        // DKIM is an email record, so email stays off
        assert_eq!(report.verification_status, VerificationStatus::Verified);
        assert!(!report.email_enabled);
    }

    #[tokio::test]
    async fn test_txt_substring_match_is_asymmetric() {
        let mut record = sample_domain_record();
        record.dns_records.truncate(1); // keep only the ownership TXT

        // Provider wraps the stored value in quotes and appends metadata
        let resolver = StaticResolver::new().with_txt(
            "_verification.example.com",
            &[&format!("\"verification-token={}\" extra", TOKEN)],
        );
        let report = DomainVerifier::new(resolver).verify(&record).await;
        assert!(report.checks[0].verified);

        // Resolved value is a substring of the stored one
        let resolver = StaticResolver::new()
            .with_txt("_verification.example.com", &["verification-token="]);
        let report = DomainVerifier::new(resolver).verify(&record).await;
        assert!(report.checks[0].verified);

        // Unrelated value matches neither direction
        let resolver =
            StaticResolver::new().with_txt("_verification.example.com", &["v=spf1 ~all"]);
        let report = DomainVerifier::new(resolver).verify(&record).await;
        assert!(!report.checks[0].verified);
    }

    #[tokio::test]
    async fn test_mx_requires_exact_host_match() {
        let record = sample_domain_record();
        let mut resolver = all_matching_resolver(&record);
        // Trailing dot and case from the resolver still count as exact
        resolver = resolver.with_mx("example.com", &["Mail.Example.Com."]);

        let verifier = DomainVerifier::new(resolver);
        let report = verifier.verify(&record).await;
        let mx_check = report
            .checks
            .iter()
            .find(|c| c.purpose == RecordPurpose::Mx)
            .unwrap();
        assert!(mx_check.verified);

        let mut resolver = all_matching_resolver(&record);
        resolver = resolver.with_mx("example.com", &["other.example.com"]);
        let report = DomainVerifier::new(resolver).verify(&record).await;
        let mx_check = report
            .checks
            .iter()
            .find(|c| c.purpose == RecordPurpose::Mx)
            .unwrap();
        assert!(!mx_check.verified);
    }

    /// Record whose mail host is published as a CNAME instead of an MX
    fn record_with_cname() -> DomainRecord {
        let mut record = sample_domain_record();
        record.dns_records.truncate(1); // keep the ownership TXT
        record.dns_records.push(DnsRecord::new(
            DnsRecordType::Cname,
            "mail.example.com".to_string(),
            "ghs.example.net".to_string(),
            RecordPurpose::Mx,
        ));
        record
    }

    #[tokio::test]
    async fn test_cname_target_containment_with_normalization() {
        let record = record_with_cname();

        // Trailing dot and case from the resolver still count, and the
        // stored value only needs to be contained in the target set
        let resolver = StaticResolver::new().with_cname(
            "mail.example.com",
            &["cdn.example.net.", "Ghs.Example.Net."],
        );
        let report = DomainVerifier::new(resolver).verify(&record).await;
        assert!(report.checks[1].verified);
        assert!(report.checks[1].detail.is_none());

        // A different target does not match
        let resolver =
            StaticResolver::new().with_cname("mail.example.com", &["other.example.net."]);
        let report = DomainVerifier::new(resolver).verify(&record).await;
        assert!(!report.checks[1].verified);
        assert!(report.checks[1].detail.is_some());
    }

    #[tokio::test]
    async fn test_cname_lookup_failure_is_isolated() {
        let record = record_with_cname();
        let resolver = StaticResolver::new()
            .with_txt(
                "_verification.example.com",
                &[&format!("verification-token={}", TOKEN)],
            )
            .with_cname_failure("mail.example.com", LookupError::Timeout);

        let report = DomainVerifier::new(resolver).verify(&record).await;

        let cname_check = &report.checks[1];
        assert!(!cname_check.verified);
        assert!(cname_check.detail.as_ref().unwrap().contains("timed out"));

        // The ownership record is still computed and gates status
        assert!(report.checks[0].verified);
        assert_eq!(report.verification_status, VerificationStatus::Verified);
    }

    #[tokio::test]
    async fn test_email_enabled_regression_flips_back_off() {
        let mut record = sample_domain_record();

        // First pass: everything verifies
        let verifier = DomainVerifier::new(all_matching_resolver(&record));
        let report = verifier.verify(&record).await;
        record.apply(report.patch);
        assert!(record.email_enabled);
        let first_verified_at = record.verified_at;
        assert!(first_verified_at.is_some());

        // Second pass: DMARC record disappeared
        let mut resolver = all_matching_resolver(&record);
        resolver = resolver.with_txt_failure("_dmarc.example.com", LookupError::NotFound);
        let report = DomainVerifier::new(resolver).verify(&record).await;
        record.apply(report.patch);

        assert!(!record.email_enabled);
        // Ownership still holds, so status stays verified
        assert_eq!(record.verification_status, VerificationStatus::Verified);
        // verified_at is not re-stamped on later passes
        assert_eq!(record.verified_at, first_verified_at);
    }

    #[tokio::test]
    async fn test_verification_is_idempotent() {
        let record = sample_domain_record();
        let verifier = DomainVerifier::new(all_matching_resolver(&record));

        let first = verifier.verify(&record).await;
        let second = verifier.verify(&record).await;

        assert_eq!(first.verification_status, second.verification_status);
        assert_eq!(first.email_enabled, second.email_enabled);
        assert_eq!(first.checks, second.checks);
    }

    #[tokio::test]
    async fn test_empty_dns_stays_pending() {
        let record = sample_domain_record();
        let verifier = DomainVerifier::new(StaticResolver::new());

        let report = verifier.verify(&record).await;

        assert_eq!(report.verification_status, VerificationStatus::Pending);
        assert!(!report.email_enabled);
        assert!(report.checks.iter().all(|c| !c.verified));
        assert!(report.patch.verified_at.is_none());
        assert!(report.patch.last_verification_attempt.is_some());
    }
}
