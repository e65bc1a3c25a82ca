//! DNS resolver abstraction
//!
//! Verification goes through the `DnsResolver` trait so tests can run against
//! programmable answers instead of live DNS. The production implementation
//! wraps `trust_dns_resolver::TokioAsyncResolver` with per-query timeouts from
//! config.

use crate::config::DnsConfig;
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;
use trust_dns_resolver::config::{ResolverConfig, ResolverOpts};
use trust_dns_resolver::error::{ResolveError, ResolveErrorKind};
use trust_dns_resolver::proto::rr::{RData, RecordType};
use trust_dns_resolver::TokioAsyncResolver;

/// Why a lookup produced no usable answer
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LookupError {
    #[error("no records found")]
    NotFound,

    #[error("query timed out")]
    Timeout,

    #[error("resolver error: {0}")]
    Resolver(String),
}

impl From<ResolveError> for LookupError {
    fn from(err: ResolveError) -> Self {
        match err.kind() {
            ResolveErrorKind::NoRecordsFound { .. } => LookupError::NotFound,
            ResolveErrorKind::Timeout => LookupError::Timeout,
            _ => LookupError::Resolver(err.to_string()),
        }
    }
}

pub type LookupResult = std::result::Result<Vec<String>, LookupError>;

/// DNS lookups needed by the verifier
#[async_trait::async_trait]
pub trait DnsResolver: Send + Sync {
    /// TXT records at `name`, with multi-string segments concatenated
    async fn lookup_txt(&self, name: &str) -> LookupResult;

    /// MX exchange hosts at `name` (trailing dots stripped)
    async fn lookup_mx(&self, name: &str) -> LookupResult;

    /// CNAME targets at `name` (trailing dots stripped)
    async fn lookup_cname(&self, name: &str) -> LookupResult;
}

/// Production resolver backed by trust-dns
pub struct TrustDnsResolver {
    resolver: TokioAsyncResolver,
}

impl TrustDnsResolver {
    pub fn new(config: &DnsConfig) -> Self {
        let mut opts = ResolverOpts::default();
        opts.timeout = Duration::from_secs(config.timeout_secs);
        opts.attempts = config.attempts;

        let resolver = TokioAsyncResolver::tokio(ResolverConfig::default(), opts);

        Self { resolver }
    }
}

#[async_trait::async_trait]
impl DnsResolver for TrustDnsResolver {
    async fn lookup_txt(&self, name: &str) -> LookupResult {
        debug!("TXT lookup: {}", name);
        let lookup = self.resolver.txt_lookup(name).await?;

        let values = lookup
            .iter()
            .map(|txt| {
                // Registrars split long TXT values into multiple strings;
                // receivers concatenate them back
                txt.txt_data()
                    .iter()
                    .map(|segment| String::from_utf8_lossy(segment).into_owned())
                    .collect::<String>()
            })
            .collect();

        Ok(values)
    }

    async fn lookup_mx(&self, name: &str) -> LookupResult {
        debug!("MX lookup: {}", name);
        let lookup = self.resolver.mx_lookup(name).await?;

        let hosts = lookup
            .iter()
            .map(|mx| mx.exchange().to_string().trim_end_matches('.').to_string())
            .collect();

        Ok(hosts)
    }

    async fn lookup_cname(&self, name: &str) -> LookupResult {
        debug!("CNAME lookup: {}", name);
        let lookup = self.resolver.lookup(name, RecordType::CNAME).await?;

        let targets = lookup
            .iter()
            .filter_map(|rdata| match rdata {
                RData::CNAME(target) => {
                    Some(target.0.to_string().trim_end_matches('.').to_string())
                }
                _ => None,
            })
            .collect();

        Ok(targets)
    }
}

/// In-process resolver with programmable answers, for tests
///
/// Unconfigured names answer `NotFound`.
#[derive(Debug, Default)]
pub struct StaticResolver {
    txt: HashMap<String, LookupResult>,
    mx: HashMap<String, LookupResult>,
    cname: HashMap<String, LookupResult>,
}

impl StaticResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_txt(mut self, name: &str, values: &[&str]) -> Self {
        self.txt.insert(
            name.to_string(),
            Ok(values.iter().map(|v| v.to_string()).collect()),
        );
        self
    }

    pub fn with_mx(mut self, name: &str, hosts: &[&str]) -> Self {
        self.mx.insert(
            name.to_string(),
            Ok(hosts.iter().map(|h| h.to_string()).collect()),
        );
        self
    }

    pub fn with_cname(mut self, name: &str, targets: &[&str]) -> Self {
        self.cname.insert(
            name.to_string(),
            Ok(targets.iter().map(|t| t.to_string()).collect()),
        );
        self
    }

    pub fn with_txt_failure(mut self, name: &str, error: LookupError) -> Self {
        self.txt.insert(name.to_string(), Err(error));
        self
    }

    pub fn with_mx_failure(mut self, name: &str, error: LookupError) -> Self {
        self.mx.insert(name.to_string(), Err(error));
        self
    }

    pub fn with_cname_failure(mut self, name: &str, error: LookupError) -> Self {
        self.cname.insert(name.to_string(), Err(error));
        self
    }

    fn answer(map: &HashMap<String, LookupResult>, name: &str) -> LookupResult {
        map.get(name).cloned().unwrap_or(Err(LookupError::NotFound))
    }
}

#[async_trait::async_trait]
impl DnsResolver for StaticResolver {
    async fn lookup_txt(&self, name: &str) -> LookupResult {
        Self::answer(&self.txt, name)
    }

    async fn lookup_mx(&self, name: &str) -> LookupResult {
        Self::answer(&self.mx, name)
    }

    async fn lookup_cname(&self, name: &str) -> LookupResult {
        Self::answer(&self.cname, name)
    }
}
