//! Core data types for email validation.
//!
//! This module defines all the main data structures used throughout the library,
//! including per-address outcomes, the batch collection, reports and configuration.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Default cap on in-flight DNS lookups.
pub const DEFAULT_MAX_CONCURRENT: usize = 100;

/// Upper bound accepted for `max_concurrent` by config validation.
pub const MAX_CONCURRENT_LIMIT: usize = 1000;

/// Default per-query DNS timeout.
pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(5);

/// Classification of a single validation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum OutcomeKind {
    /// Well-formed address whose domain has MX records
    #[serde(rename = "valid")]
    Valid,

    /// Address rejected by the syntax filter; no lookup was made
    #[serde(rename = "invalid_format")]
    InvalidFormat,

    /// Lookup returned no records, failed, or timed out
    #[serde(rename = "no_mx")]
    NoMailExchange,

    /// Internal fault while validating this address
    #[serde(rename = "lookup_error")]
    LookupError,
}

impl OutcomeKind {
    /// Default human-readable reason attached to outcomes of this kind.
    pub fn default_reason(self) -> &'static str {
        match self {
            OutcomeKind::Valid => "Valid",
            OutcomeKind::InvalidFormat => "Invalid format",
            OutcomeKind::NoMailExchange => "No MX records",
            OutcomeKind::LookupError => "Lookup error",
        }
    }
}

impl fmt::Display for OutcomeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutcomeKind::Valid => write!(f, "valid"),
            OutcomeKind::InvalidFormat => write!(f, "invalid_format"),
            OutcomeKind::NoMailExchange => write!(f, "no_mx"),
            OutcomeKind::LookupError => write!(f, "lookup_error"),
        }
    }
}

/// Result of validating one email address.
///
/// Created exactly once per input address and never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ValidationOutcome {
    /// The address exactly as supplied
    pub address: String,

    /// What the validation concluded
    pub status: OutcomeKind,

    /// Short reason shown to the user
    pub reason: String,
}

impl ValidationOutcome {
    /// Build an outcome with the default reason for `status`.
    pub fn new<A: Into<String>>(address: A, status: OutcomeKind) -> Self {
        Self {
            address: address.into(),
            status,
            reason: status.default_reason().to_string(),
        }
    }

    pub fn valid<A: Into<String>>(address: A) -> Self {
        Self::new(address, OutcomeKind::Valid)
    }

    pub fn invalid_format<A: Into<String>>(address: A) -> Self {
        Self::new(address, OutcomeKind::InvalidFormat)
    }

    pub fn no_mail_exchange<A: Into<String>>(address: A) -> Self {
        Self::new(address, OutcomeKind::NoMailExchange)
    }

    /// Build a `LookupError` outcome carrying the fault description.
    pub fn lookup_error<A: Into<String>, R: Into<String>>(address: A, reason: R) -> Self {
        Self {
            address: address.into(),
            status: OutcomeKind::LookupError,
            reason: reason.into(),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.status == OutcomeKind::Valid
    }
}

/// All outcomes of one batch run.
///
/// Holds exactly one outcome per input address. Order carries no meaning.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct BatchResult {
    outcomes: Vec<ValidationOutcome>,
}

impl BatchResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ValidationOutcome> {
        self.outcomes.iter()
    }

    pub fn outcomes(&self) -> &[ValidationOutcome] {
        &self.outcomes
    }

    /// Find the outcome recorded for `address`, if any.
    pub fn get(&self, address: &str) -> Option<&ValidationOutcome> {
        self.outcomes.iter().find(|o| o.address == address)
    }

    /// Number of outcomes with the given status.
    pub fn count(&self, status: OutcomeKind) -> usize {
        self.outcomes.iter().filter(|o| o.status == status).count()
    }

    pub fn into_outcomes(self) -> Vec<ValidationOutcome> {
        self.outcomes
    }
}

impl From<Vec<ValidationOutcome>> for BatchResult {
    fn from(outcomes: Vec<ValidationOutcome>) -> Self {
        Self { outcomes }
    }
}

impl FromIterator<ValidationOutcome> for BatchResult {
    fn from_iter<I: IntoIterator<Item = ValidationOutcome>>(iter: I) -> Self {
        Self {
            outcomes: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a BatchResult {
    type Item = &'a ValidationOutcome;
    type IntoIter = std::slice::Iter<'a, ValidationOutcome>;

    fn into_iter(self) -> Self::IntoIter {
        self.outcomes.iter()
    }
}

/// A single MX record as returned by a resolver.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MxRecord {
    /// Lower values are preferred
    pub preference: u16,

    /// Mail exchanger host, lowercase, without trailing dot
    pub exchange: String,
}

impl MxRecord {
    pub fn new<E: Into<String>>(preference: u16, exchange: E) -> Self {
        Self {
            preference,
            exchange: exchange.into(),
        }
    }
}

/// One line of the failure listing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FailureEntry {
    pub address: String,
    pub reason: String,
}

/// Per-kind counts of non-valid outcomes.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct OutcomeBreakdown {
    pub invalid_format: usize,
    pub no_mail_exchange: usize,
    pub lookup_error: usize,
}

/// Aggregate statistics for a finished batch.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Report {
    pub total: usize,
    pub valid: usize,
    pub invalid: usize,

    /// Percentage of valid outcomes, 0.0 for an empty batch
    pub success_rate: f64,

    /// Non-valid outcomes, in batch order
    pub failures: Vec<FailureEntry>,

    pub breakdown: OutcomeBreakdown,
}

/// Which nameservers the DNS client queries.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum NameserverChoice {
    /// Use /etc/resolv.conf (or the platform equivalent)
    #[default]
    System,
    Google,
    Cloudflare,
    Quad9,
}

impl FromStr for NameserverChoice {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "system" => Ok(NameserverChoice::System),
            "google" => Ok(NameserverChoice::Google),
            "cloudflare" => Ok(NameserverChoice::Cloudflare),
            "quad9" => Ok(NameserverChoice::Quad9),
            other => Err(format!(
                "Unknown resolver '{}'. Use one of: system, google, cloudflare, quad9",
                other
            )),
        }
    }
}

impl fmt::Display for NameserverChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NameserverChoice::System => write!(f, "system"),
            NameserverChoice::Google => write!(f, "google"),
            NameserverChoice::Cloudflare => write!(f, "cloudflare"),
            NameserverChoice::Quad9 => write!(f, "quad9"),
        }
    }
}

/// Configuration options for validation runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidateConfig {
    /// Maximum number of DNS lookups in flight at once
    /// Default: 100
    pub max_concurrent: usize,

    /// Upper bound for a single MX query
    /// Default: 5 seconds
    #[serde(skip)] // Don't serialize Duration directly
    pub query_timeout: Duration,

    /// Which nameservers to ask
    /// Default: system configuration
    pub nameserver: NameserverChoice,

    /// Resolver-level attempts per query (inside the timeout)
    /// Default: 2
    pub attempts: usize,
}

impl Default for ValidateConfig {
    fn default() -> Self {
        Self {
            max_concurrent: DEFAULT_MAX_CONCURRENT,
            query_timeout: DEFAULT_QUERY_TIMEOUT,
            nameserver: NameserverChoice::System,
            attempts: 2,
        }
    }
}

impl ValidateConfig {
    /// Set the concurrency cap. Zero is raised to one.
    pub fn with_max_concurrent(mut self, max_concurrent: usize) -> Self {
        self.max_concurrent = max_concurrent.max(1);
        self
    }

    /// Set the per-query timeout.
    pub fn with_query_timeout(mut self, timeout: Duration) -> Self {
        self.query_timeout = timeout;
        self
    }

    pub fn with_nameserver(mut self, nameserver: NameserverChoice) -> Self {
        self.nameserver = nameserver;
        self
    }

    pub fn with_attempts(mut self, attempts: usize) -> Self {
        self.attempts = attempts.max(1);
        self
    }
}
