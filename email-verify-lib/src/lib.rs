//! # Email Verify Library
//!
//! Validate batches of email addresses by syntax and MX records, with a
//! hard bound on how many DNS lookups run at once.
//!
//! Every input address yields exactly one outcome, whatever happens to its
//! lookup: no records, DNS failure, timeout or even a panic inside the
//! validation task.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use email_verify_lib::{EmailChecker, ValidateConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let checker = EmailChecker::with_config(ValidateConfig::default())?;
//!     let outcome = checker.validate_email("user@example.com").await;
//!
//!     println!("{}: {}", outcome.address, outcome.reason);
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Syntax filter**: malformed addresses never reach DNS
//! - **MX lookups**: async trust-dns resolver with a per-query timeout
//! - **Bounded concurrency**: FIFO admission gate over in-flight lookups
//! - **Batch or stream**: collect everything, or consume outcomes as they land
//! - **Pluggable resolver**: implement `MxResolver` to test without a network

// Re-export main public API types and functions
pub use checker::EmailChecker;
pub use concurrent::{
    run_batch, BatchDispatcher, ConcurrencyLimiter, ConcurrencySlot, NoProgress, ProgressCounter,
    ProgressReporter,
};
pub use config::{
    env_config_from, load_env_config, parse_timeout_string, ConfigManager, DefaultsConfig,
    EnvConfig, FileConfig, OutputConfig, MAX_ATTEMPTS,
};
pub use error::ValidationError;
pub use protocols::{DnsClient, DomainResolver, MxResolver};
pub use report::summarize;
pub use syntax::{extract_domain, is_valid_format};
pub use types::{
    BatchResult, FailureEntry, MxRecord, NameserverChoice, OutcomeBreakdown, OutcomeKind, Report,
    ValidateConfig, ValidationOutcome, DEFAULT_MAX_CONCURRENT, DEFAULT_QUERY_TIMEOUT,
    MAX_CONCURRENT_LIMIT,
};
pub use utils::{parse_address_lines, read_addresses_from_file};
pub use validator::EmailValidator;

// Internal modules - these are not part of the public API
mod checker;
mod concurrent;
mod config;
mod error;
mod protocols;
mod report;
mod syntax;
mod types;
mod utils;
mod validator;

// Type alias for convenience
pub type Result<T> = std::result::Result<T, ValidationError>;

// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
