//! mailauth-rs: domain email-authentication engine
//!
//! The engine behind custom sending domains in a multi-tenant back office:
//! when a customer connects their own domain, it generates the DKIM key pair
//! and the DNS records they must publish, verifies those records against live
//! DNS, and signs outbound messages with DKIM.
//!
//! # Components
//!
//! - **Generator** ([`generator`]): DKIM RSA key pair, ownership token and
//!   the five-record DNS set (ownership, SPF, DKIM, DMARC, MX) for a new
//!   sending domain.
//! - **Verifier** ([`verifier`]): resolves each record against live DNS,
//!   recomputes per-record pass/fail and derives the aggregate status and
//!   whether outbound email is enabled.
//! - **Signer** ([`signer`]): canonicalizes headers/body per DKIM
//!   simple/relaxed and produces a complete DKIM-Signature header value.
//!
//! The engine is a library with no network surface of its own; callers load
//! and persist [`DomainRecord`]s, the engine computes. All inputs are explicit
//! arguments, there are no ambient singletons.
//!
//! # Example
//!
//! ```no_run
//! use mailauth_rs::config::EngineConfig;
//! use mailauth_rs::generator::provision_domain;
//! use mailauth_rs::verifier::resolver::TrustDnsResolver;
//! use mailauth_rs::verifier::DomainVerifier;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = EngineConfig::default();
//!     let mut record = provision_domain("https://www.example.com", &config)?;
//!
//!     // ... customer publishes the records, then:
//!     let verifier = DomainVerifier::new(TrustDnsResolver::new(&config.dns));
//!     let report = verifier.verify(&record).await;
//!     record.apply(report.patch);
//!
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod domain;
pub mod error;
pub mod generator;
pub mod keys;
pub mod record;
pub mod signer;
pub mod verifier;

// Re-export commonly used types
pub use config::EngineConfig;
pub use error::{MailAuthError, Result};
pub use record::{DnsRecord, DomainRecord, DomainRecordPatch, VerificationStatus};
