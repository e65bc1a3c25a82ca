//! DNS record set generation and domain provisioning
//!
//! Runs once when a customer registers a sending domain. Produces the DKIM
//! key pair, the ownership token and the five DNS records the customer must
//! publish, plus operator-facing output (setup checklist, zone file lines).

use crate::config::EngineConfig;
use crate::domain::{normalize_domain, validate_domain};
use crate::error::Result;
use crate::keys::{generate_dkim_selector, generate_verification_token, DkimKeyPair};
use crate::record::{
    DnsRecord, DnsRecordType, DomainRecord, RecordPurpose, VerificationStatus,
};
use chrono::Utc;
use tracing::info;

/// Build the full record set for a domain, in fixed order:
/// ownership, SPF, DKIM, DMARC, MX. All records start unverified.
pub fn generate_dns_records(
    domain: &str,
    token: &str,
    selector: &str,
    dkim_public_key_for_dns: &str,
    config: &EngineConfig,
) -> Vec<DnsRecord> {
    let records = &config.records;
    let mail_host = format!("{}.{}", records.mail_host_prefix, domain);

    vec![
        DnsRecord::new(
            DnsRecordType::Txt,
            format!("{}.{}", records.ownership_prefix, domain),
            format!("verification-token={}", token),
            RecordPurpose::Ownership,
        ),
        DnsRecord::new(
            DnsRecordType::Txt,
            domain.to_string(),
            format!("v=spf1 include:{} ~all", records.spf_include),
            RecordPurpose::Spf,
        ),
        DnsRecord::new(
            DnsRecordType::Txt,
            format!("{}._domainkey.{}", selector, domain),
            format!("v=DKIM1; k=rsa; p={}", dkim_public_key_for_dns),
            RecordPurpose::Dkim,
        ),
        DnsRecord::new(
            DnsRecordType::Txt,
            format!("_dmarc.{}", domain),
            format!(
                "v=DMARC1; p=quarantine; rua=mailto:{mbox}@{domain}; ruf=mailto:{mbox}@{domain}; fo=1; adkim=s; aspf=s; pct=100; ri=86400",
                mbox = records.dmarc_mailbox,
                domain = domain
            ),
            RecordPurpose::Dmarc,
        ),
        DnsRecord::mx(domain.to_string(), mail_host, records.mx_priority),
    ]
}

/// Provision a new sending domain: normalize, validate, generate key material
/// and the full DNS record set
///
/// The returned record has `verification_status = pending` and
/// `email_enabled = false`; the caller persists it (encrypting the private
/// key first) and later runs the verifier against it.
pub fn provision_domain(input: &str, config: &EngineConfig) -> Result<DomainRecord> {
    let domain = normalize_domain(input);
    validate_domain(&domain)?;

    let token = generate_verification_token();
    let selector = generate_dkim_selector();
    let key_pair = DkimKeyPair::generate(config.records.dkim_key_bits)?;

    let dns_records = generate_dns_records(
        &domain,
        &token,
        &selector,
        &key_pair.public_key_for_dns(),
        config,
    );

    info!("Provisioned domain {} with selector {}", domain, selector);

    Ok(DomainRecord {
        domain,
        verification_status: VerificationStatus::Pending,
        verification_token: token,
        dkim_selector: selector,
        dkim_private_key: key_pair.private_key_pem,
        dkim_public_key: key_pair.public_key_pem,
        dns_records,
        email_enabled: false,
        last_verification_attempt: None,
        verified_at: None,
        updated_at: Utc::now(),
    })
}

/// Human-readable DNS setup checklist for the customer
pub fn setup_instructions(record: &DomainRecord) -> String {
    let mut instructions = String::new();
    instructions.push_str(&format!("DNS configuration for {}\n", record.domain));
    instructions.push_str(&"=".repeat(60));
    instructions.push_str("\n\nAdd the following DNS records to your domain:\n\n");

    for dns_record in &record.dns_records {
        instructions.push_str(&format!("Record type: {}\n", dns_record.record_type));
        instructions.push_str(&format!("Name: {}\n", dns_record.name));
        instructions.push_str(&format!("Value: {}\n", dns_record.value));
        if let Some(priority) = dns_record.priority {
            instructions.push_str(&format!("Priority: {}\n", priority));
        }
        instructions.push_str(&format!("Purpose: {}\n\n", dns_record.purpose));
    }

    instructions.push_str("NOTES:\n");
    instructions.push_str("- DNS changes may take up to 48 hours to propagate\n");
    instructions.push_str(&format!(
        "- Check your SPF record with: dig TXT {}\n",
        record.domain
    ));
    instructions.push_str(&format!(
        "- Check your DKIM record with: dig TXT {}._domainkey.{}\n",
        record.dkim_selector, record.domain
    ));
    instructions.push_str(&format!(
        "- Check your DMARC record with: dig TXT _dmarc.{}\n",
        record.domain
    ));

    instructions
}

/// BIND zone-file rendering of the record set
pub fn zone_file(record: &DomainRecord) -> String {
    let mut zone = String::new();
    zone.push_str(&format!("; Zone file fragment for {}\n", record.domain));
    zone.push_str(&format!("; Generated on {}\n\n", Utc::now()));

    for dns_record in &record.dns_records {
        zone.push_str(&dns_record.to_zone_line());
        zone.push_str(&format!(" ; {}\n", dns_record.purpose));
    }

    zone
}
