//! Per-address validation.
//!
//! Combines the syntax filter with the MX lookup. The syntax check always
//! runs first and short-circuits, so malformed addresses never touch DNS.

use crate::protocols::DomainResolver;
use crate::syntax::{extract_domain, is_valid_format};
use crate::types::ValidationOutcome;

/// Validates one address at a time.
#[derive(Clone)]
pub struct EmailValidator {
    resolver: DomainResolver,
}

impl EmailValidator {
    pub fn new(resolver: DomainResolver) -> Self {
        Self { resolver }
    }

    pub fn resolver(&self) -> &DomainResolver {
        &self.resolver
    }

    /// Validate a single address.
    ///
    /// The checking process:
    /// 1. Rejects addresses that fail the format filter (no network call)
    /// 2. Extracts the domain after the first `@`
    /// 3. Asks the resolver whether the domain has MX records
    ///
    /// Never fails: every path produces an outcome.
    pub async fn validate(&self, address: &str) -> ValidationOutcome {
        if !is_valid_format(address) {
            tracing::debug!(address, "rejected by format filter");
            return ValidationOutcome::invalid_format(address);
        }

        // The format filter guarantees an '@', but stay total anyway
        let Some(domain) = extract_domain(address) else {
            tracing::debug!(address, "no domain part after format check");
            return ValidationOutcome::invalid_format(address);
        };

        if !self.resolver.has_mail_exchange(domain).await {
            return ValidationOutcome::no_mail_exchange(address);
        }

        ValidationOutcome::valid(address)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationError;
    use crate::protocols::MxResolver;
    use crate::types::{MxRecord, OutcomeKind};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    /// Answers only for example.com and counts every call.
    #[derive(Default)]
    struct CountingResolver {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl MxResolver for CountingResolver {
        async fn lookup_mx(&self, domain: &str) -> Result<Vec<MxRecord>, ValidationError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match domain {
                "example.com" => Ok(vec![MxRecord::new(10, "mx.example.com")]),
                "flaky.example" => Err(ValidationError::dns(domain, "SERVFAIL")),
                _ => Ok(vec![]),
            }
        }
    }

    fn validator_with(stub: Arc<CountingResolver>) -> EmailValidator {
        EmailValidator::new(DomainResolver::new(stub, Duration::from_secs(1)))
    }

    #[test]
    fn test_invalid_format_skips_lookup() {
        let stub = Arc::new(CountingResolver::default());
        let validator = validator_with(stub.clone());

        let outcome = tokio_test::block_on(validator.validate("bad-format"));

        assert_eq!(outcome.status, OutcomeKind::InvalidFormat);
        assert_eq!(outcome.reason, "Invalid format");
        assert_eq!(stub.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_valid_and_no_mx() {
        let stub = Arc::new(CountingResolver::default());
        let validator = validator_with(stub.clone());

        let good = validator.validate("good@example.com").await;
        assert_eq!(good, ValidationOutcome::valid("good@example.com"));

        let nomx = validator.validate("nouser@no-mx-domain.test").await;
        assert_eq!(nomx.status, OutcomeKind::NoMailExchange);
        assert_eq!(nomx.reason, "No MX records");

        assert_eq!(stub.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_resolver_error_is_no_mail_exchange() {
        let validator = validator_with(Arc::new(CountingResolver::default()));
        let outcome = validator.validate("someone@flaky.example").await;
        assert_eq!(outcome.status, OutcomeKind::NoMailExchange);
    }

    #[tokio::test]
    async fn test_address_preserved_verbatim() {
        let validator = validator_with(Arc::new(CountingResolver::default()));
        let outcome = validator.validate("Mixed.Case@example.com").await;
        assert_eq!(outcome.address, "Mixed.Case@example.com");
    }
}
