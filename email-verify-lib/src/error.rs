//! Error handling for email validation operations.
//!
//! Per-address failures never surface as errors: they become outcomes.
//! This type covers the remaining failure modes, such as resolver setup,
//! configuration, input files, and the internal detail of a failed lookup
//! before it is collapsed into a negative answer.

use std::fmt;
use std::time::Duration;
use trust_dns_resolver::error::{ResolveError, ResolveErrorKind};

/// Main error type for email validation operations.
#[derive(Debug, Clone)]
pub enum ValidationError {
    /// Address could not be split into local part and domain
    InvalidAddress {
        address: String,
        reason: String,
    },

    /// DNS query failed (NXDOMAIN, network error, malformed name, ...)
    DnsError {
        domain: String,
        message: String,
    },

    /// DNS query succeeded but returned no MX records
    NoRecords {
        domain: String,
    },

    /// Timeout errors when a lookup takes too long
    Timeout {
        operation: String,
        duration: Duration,
    },

    /// The DNS client could not be constructed
    ResolverInit {
        message: String,
    },

    /// Configuration errors (invalid settings, unparsable files, etc.)
    ConfigError {
        message: String,
    },

    /// File I/O errors when reading address lists or config files
    FileError {
        path: String,
        message: String,
    },

    /// Generic internal errors that don't fit other categories
    Internal {
        message: String,
    },
}

impl ValidationError {
    /// Create a new invalid address error.
    pub fn invalid_address<A: Into<String>, R: Into<String>>(address: A, reason: R) -> Self {
        Self::InvalidAddress {
            address: address.into(),
            reason: reason.into(),
        }
    }

    /// Create a new DNS error.
    pub fn dns<D: Into<String>, M: Into<String>>(domain: D, message: M) -> Self {
        Self::DnsError {
            domain: domain.into(),
            message: message.into(),
        }
    }

    /// Create a new "no MX records" error.
    pub fn no_records<D: Into<String>>(domain: D) -> Self {
        Self::NoRecords {
            domain: domain.into(),
        }
    }

    /// Create a new timeout error.
    pub fn timeout<O: Into<String>>(operation: O, duration: Duration) -> Self {
        Self::Timeout {
            operation: operation.into(),
            duration,
        }
    }

    /// Create a new configuration error.
    pub fn config<M: Into<String>>(message: M) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }

    /// Create a new file error.
    pub fn file_error<P: Into<String>, M: Into<String>>(path: P, message: M) -> Self {
        Self::FileError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a new internal error.
    pub fn internal<M: Into<String>>(message: M) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Build an error from a resolver failure for a specific domain.
    ///
    /// Keeps the "no records" and "timed out" cases distinguishable for
    /// logging, even though callers collapse them into the same outcome.
    pub fn from_resolve<D: Into<String>>(domain: D, err: &ResolveError) -> Self {
        let domain = domain.into();
        match err.kind() {
            ResolveErrorKind::NoRecordsFound { .. } => Self::no_records(domain),
            ResolveErrorKind::Timeout => {
                Self::timeout(format!("MX lookup for {}", domain), Duration::ZERO)
            }
            _ => Self::dns(domain, err.to_string()),
        }
    }

    /// Whether this error came from a lookup that ran out of time.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// Whether this error means the domain simply has no MX records.
    pub fn is_no_records(&self) -> bool {
        matches!(self, Self::NoRecords { .. })
    }

    /// Short label used in logs.
    pub fn kind_label(&self) -> &'static str {
        match self {
            Self::InvalidAddress { .. } => "invalid_address",
            Self::DnsError { .. } => "dns_error",
            Self::NoRecords { .. } => "no_records",
            Self::Timeout { .. } => "timeout",
            Self::ResolverInit { .. } => "resolver_init",
            Self::ConfigError { .. } => "config",
            Self::FileError { .. } => "file",
            Self::Internal { .. } => "internal",
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidAddress { address, reason } => {
                write!(f, "Invalid address '{}': {}", address, reason)
            }
            Self::DnsError { domain, message } => {
                write!(f, "DNS error for '{}': {}", domain, message)
            }
            Self::NoRecords { domain } => {
                write!(f, "No MX records found for '{}'", domain)
            }
            Self::Timeout {
                operation,
                duration,
            } => {
                if duration.is_zero() {
                    write!(f, "Timeout during: {}", operation)
                } else {
                    write!(f, "Timeout after {:?} during: {}", duration, operation)
                }
            }
            Self::ResolverInit { message } => {
                write!(f, "Failed to create DNS resolver: {}", message)
            }
            Self::ConfigError { message } => {
                write!(f, "Configuration error: {}", message)
            }
            Self::FileError { path, message } => {
                write!(f, "File error at '{}': {}", path, message)
            }
            Self::Internal { message } => {
                write!(f, "Internal error: {}", message)
            }
        }
    }
}

impl std::error::Error for ValidationError {}

// Only resolver construction converts through `?`; lookups use `from_resolve`.
impl From<ResolveError> for ValidationError {
    fn from(err: ResolveError) -> Self {
        Self::ResolverInit {
            message: err.to_string(),
        }
    }
}

impl From<std::io::Error> for ValidationError {
    fn from(err: std::io::Error) -> Self {
        Self::Internal {
            message: format!("I/O error: {}", err),
        }
    }
}

impl From<toml::de::Error> for ValidationError {
    fn from(err: toml::de::Error) -> Self {
        Self::ConfigError {
            message: format!("Failed to parse TOML configuration: {}", err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let err = ValidationError::dns("example.test", "NXDOMAIN");
        assert_eq!(err.to_string(), "DNS error for 'example.test': NXDOMAIN");

        let err = ValidationError::timeout("MX lookup", Duration::from_secs(5));
        assert_eq!(err.to_string(), "Timeout after 5s during: MX lookup");

        let err = ValidationError::no_records("nomx.test");
        assert!(err.to_string().contains("nomx.test"));
    }

    #[test]
    fn test_classification_helpers() {
        assert!(ValidationError::timeout("x", Duration::from_millis(1)).is_timeout());
        assert!(!ValidationError::no_records("x").is_timeout());
        assert!(ValidationError::no_records("x").is_no_records());
        assert_eq!(ValidationError::config("bad").kind_label(), "config");
    }

    #[test]
    fn test_from_toml_error() {
        let parse: std::result::Result<toml::Table, toml::de::Error> = toml::from_str("= broken");
        let err: ValidationError = parse.unwrap_err().into();
        assert!(matches!(err, ValidationError::ConfigError { .. }));
    }
}
