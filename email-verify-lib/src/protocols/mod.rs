//! Network protocol implementations used during validation.
//!
//! Only DNS is needed: a domain can receive mail if it publishes MX records.

/// MX lookups and the resolver seam
pub mod dns;

// Re-export commonly used types
pub use dns::{DnsClient, DomainResolver, MxResolver};
