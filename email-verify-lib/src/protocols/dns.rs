//! MX record lookups.
//!
//! `MxResolver` is the seam between validation and the network. `DnsClient`
//! is the production implementation over trust-dns; tests plug in stubs.
//! `DomainResolver` wraps any resolver, bounds each query with a timeout and
//! collapses every failure mode into a plain "no mail exchange" answer.

use crate::error::ValidationError;
use crate::types::{MxRecord, NameserverChoice, ValidateConfig};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use trust_dns_resolver::config::{ResolverConfig, ResolverOpts};
use trust_dns_resolver::TokioAsyncResolver;

/// Anything that can answer an MX query for a domain.
#[async_trait]
pub trait MxResolver: Send + Sync {
    /// Look up the MX records of `domain`.
    ///
    /// An empty `Ok` vector and a `NoRecords` error mean the same thing;
    /// implementations may return either.
    async fn lookup_mx(&self, domain: &str) -> Result<Vec<MxRecord>, ValidationError>;
}

/// MX lookups through an async trust-dns resolver.
#[derive(Clone)]
pub struct DnsClient {
    resolver: TokioAsyncResolver,
}

impl DnsClient {
    /// Build a client from the validation config.
    ///
    /// The query timeout is split across resolver attempts; the outer
    /// `tokio::time::timeout` in `DomainResolver` still caps the total.
    pub fn from_config(config: &ValidateConfig) -> Result<Self, ValidationError> {
        let (resolver_config, mut opts) = match config.nameserver {
            NameserverChoice::System => {
                trust_dns_resolver::system_conf::read_system_conf().map_err(init_error)?
            }
            NameserverChoice::Google => (ResolverConfig::google(), ResolverOpts::default()),
            NameserverChoice::Cloudflare => {
                (ResolverConfig::cloudflare(), ResolverOpts::default())
            }
            NameserverChoice::Quad9 => (ResolverConfig::quad9(), ResolverOpts::default()),
        };

        let attempts = config.attempts.max(1);
        opts.attempts = attempts;
        opts.timeout = per_attempt_timeout(config.query_timeout, attempts);

        Ok(Self {
            resolver: TokioAsyncResolver::tokio(resolver_config, opts),
        })
    }
}

/// Resolver setup failures, whatever their source type.
fn init_error<E: std::fmt::Display>(err: E) -> ValidationError {
    ValidationError::ResolverInit {
        message: err.to_string(),
    }
}

/// Split the overall query budget across resolver attempts.
fn per_attempt_timeout(total: Duration, attempts: usize) -> Duration {
    let per = total / attempts.max(1) as u32;
    per.max(Duration::from_millis(100))
}

/// Normalize an exchange host name: lowercase, no trailing dot.
pub(crate) fn normalize_exchange(exchange: &str) -> String {
    exchange.trim_end_matches('.').to_ascii_lowercase()
}

#[async_trait]
impl MxResolver for DnsClient {
    async fn lookup_mx(&self, domain: &str) -> Result<Vec<MxRecord>, ValidationError> {
        let lookup = self
            .resolver
            .mx_lookup(domain)
            .await
            .map_err(|e| ValidationError::from_resolve(domain, &e))?;

        let mut records: Vec<MxRecord> = lookup
            .iter()
            .map(|mx| {
                MxRecord::new(
                    mx.preference(),
                    normalize_exchange(&mx.exchange().to_utf8()),
                )
            })
            .collect();
        records.sort();
        records.dedup();
        Ok(records)
    }
}

/// Answers "can this domain receive mail?" with a bounded-time MX lookup.
#[derive(Clone)]
pub struct DomainResolver {
    inner: Arc<dyn MxResolver>,
    timeout: Duration,
}

impl DomainResolver {
    pub fn new(inner: Arc<dyn MxResolver>, timeout: Duration) -> Self {
        Self { inner, timeout }
    }

    /// Build a resolver backed by a real DNS client.
    pub fn from_config(config: &ValidateConfig) -> Result<Self, ValidationError> {
        let client = DnsClient::from_config(config)?;
        Ok(Self::new(Arc::new(client), config.query_timeout))
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Look up MX records, failing with `Timeout` if the query overruns.
    pub async fn lookup(&self, domain: &str) -> Result<Vec<MxRecord>, ValidationError> {
        match tokio::time::timeout(self.timeout, self.inner.lookup_mx(domain)).await {
            Ok(result) => result,
            Err(_) => Err(ValidationError::timeout(
                format!("MX lookup for {}", domain),
                self.timeout,
            )),
        }
    }

    /// `true` iff the domain has at least one MX record.
    ///
    /// Failures of any kind (no records, NXDOMAIN, timeout, network) yield
    /// `false`. The failure kind is only visible in debug logs.
    pub async fn has_mail_exchange(&self, domain: &str) -> bool {
        match self.lookup(domain).await {
            Ok(records) if !records.is_empty() => {
                tracing::debug!(domain, records = records.len(), "MX lookup succeeded");
                true
            }
            Ok(_) => {
                tracing::debug!(domain, kind = "no_records", "MX lookup returned nothing");
                false
            }
            Err(e) => {
                tracing::debug!(domain, kind = e.kind_label(), error = %e, "MX lookup failed");
                false
            }
        }
    }
}
