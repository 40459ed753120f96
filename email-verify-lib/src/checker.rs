//! Main email checker implementation.
//!
//! This module provides the primary `EmailChecker` struct that wires the
//! resolver, validator and dispatcher together from a single configuration.

use crate::concurrent::{BatchDispatcher, ProgressReporter};
use crate::error::ValidationError;
use crate::protocols::{DomainResolver, MxResolver};
use crate::report::summarize;
use crate::types::{BatchResult, Report, ValidateConfig, ValidationOutcome};
use crate::utils::read_addresses_from_file;
use crate::validator::EmailValidator;
use futures::stream::Stream;
use std::path::Path;
use std::pin::Pin;
use std::sync::Arc;

/// Main email checker that coordinates validation runs.
///
/// # Example
///
/// ```rust,no_run
/// use email_verify_lib::{EmailChecker, ValidateConfig};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let checker = EmailChecker::with_config(ValidateConfig::default().with_max_concurrent(20))?;
///     let addresses = vec!["user@example.com".to_string(), "bad-format".to_string()];
///
///     let batch = checker.validate_emails(&addresses).await;
///     let report = checker.summarize(&batch);
///     println!("{} of {} valid", report.valid, report.total);
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct EmailChecker {
    /// Configuration settings for this checker instance
    config: ValidateConfig,
    validator: Arc<EmailValidator>,
    dispatcher: BatchDispatcher,
}

impl EmailChecker {
    /// Create a checker with default configuration.
    ///
    /// Default settings:
    /// - Max concurrent lookups: 100
    /// - Query timeout: 5 seconds
    /// - Nameservers: system configuration
    pub fn new() -> Result<Self, ValidationError> {
        Self::with_config(ValidateConfig::default())
    }

    /// Create a checker backed by a real DNS client.
    ///
    /// # Errors
    ///
    /// Returns `ResolverInit` if the system resolver configuration cannot be
    /// read.
    pub fn with_config(config: ValidateConfig) -> Result<Self, ValidationError> {
        let resolver = DomainResolver::from_config(&config)?;
        Ok(Self::from_parts(config, resolver))
    }

    /// Create a checker that asks `resolver` instead of the network.
    ///
    /// The configured query timeout still applies.
    pub fn with_resolver(config: ValidateConfig, resolver: Arc<dyn MxResolver>) -> Self {
        let resolver = DomainResolver::new(resolver, config.query_timeout);
        Self::from_parts(config, resolver)
    }

    fn from_parts(config: ValidateConfig, resolver: DomainResolver) -> Self {
        let validator = Arc::new(EmailValidator::new(resolver));
        let dispatcher = BatchDispatcher::from_shared(validator.clone(), config.max_concurrent);
        Self {
            config,
            validator,
            dispatcher,
        }
    }

    /// Attach a progress reporter used by batch and stream runs.
    pub fn with_progress(mut self, reporter: Arc<dyn ProgressReporter>) -> Self {
        self.dispatcher = self.dispatcher.with_progress(reporter);
        self
    }

    /// Validate a single address.
    ///
    /// Runs outside the concurrency limiter.
    pub async fn validate_email(&self, address: &str) -> ValidationOutcome {
        self.validator.validate(address).await
    }

    /// Validate many addresses concurrently and return all outcomes at once.
    ///
    /// Exactly one outcome per input, in input order.
    pub async fn validate_emails(&self, addresses: &[String]) -> BatchResult {
        self.dispatcher.run_batch(addresses).await
    }

    /// Validate addresses and yield outcomes as they complete.
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use email_verify_lib::EmailChecker;
    /// use futures::StreamExt;
    ///
    /// #[tokio::main]
    /// async fn main() -> Result<(), Box<dyn std::error::Error>> {
    ///     let checker = EmailChecker::new()?;
    ///     let addresses = vec!["user@example.com".to_string()];
    ///
    ///     let mut stream = checker.validate_emails_stream(&addresses);
    ///     while let Some(outcome) = stream.next().await {
    ///         println!("{}: {}", outcome.address, outcome.reason);
    ///     }
    ///     Ok(())
    /// }
    /// ```
    pub fn validate_emails_stream<'a>(
        &'a self,
        addresses: &'a [String],
    ) -> Pin<Box<dyn Stream<Item = ValidationOutcome> + Send + 'a>> {
        self.dispatcher.run_stream(addresses)
    }

    /// Read an address file and validate every entry.
    pub async fn validate_emails_from_file<P: AsRef<Path>>(
        &self,
        path: P,
    ) -> Result<BatchResult, ValidationError> {
        let addresses = read_addresses_from_file(path)?;
        Ok(self.validate_emails(&addresses).await)
    }

    pub fn summarize(&self, batch: &BatchResult) -> Report {
        summarize(batch)
    }

    /// Get the current configuration for this checker.
    pub fn config(&self) -> &ValidateConfig {
        &self.config
    }
}
