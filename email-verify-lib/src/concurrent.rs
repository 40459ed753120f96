//! Concurrent processing for batch validation.
//!
//! This module provides the admission gate that bounds in-flight lookups,
//! the shared progress counter, and the dispatcher that fans a batch of
//! addresses out over tokio tasks while guaranteeing exactly one outcome
//! per input.

use crate::error::ValidationError;
use crate::types::{BatchResult, ValidationOutcome};
use crate::validator::EmailValidator;
use futures::stream::{self, Stream, StreamExt};
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::task::JoinSet;

// ── Concurrency limiter ──────────────────────────────────────────────────────

/// Counting admission gate for DNS lookups.
///
/// Backed by a tokio semaphore, which hands out permits in FIFO order, so
/// no waiter can be overtaken indefinitely.
#[derive(Debug, Clone)]
pub struct ConcurrencyLimiter {
    semaphore: Arc<Semaphore>,
    capacity: usize,
}

/// A held slot. Dropping it returns the slot to the limiter.
#[derive(Debug)]
pub struct ConcurrencySlot {
    _permit: OwnedSemaphorePermit,
}

impl ConcurrencyLimiter {
    /// Create a limiter with `capacity` slots. Zero is raised to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(capacity)),
            capacity,
        }
    }

    /// Wait for a free slot.
    pub async fn acquire(&self) -> Result<ConcurrencySlot, ValidationError> {
        let permit = self
            .semaphore
            .clone()
            .acquire_owned()
            .await
            .map_err(|e| {
                ValidationError::internal(format!("concurrency limiter closed: {}", e))
            })?;
        Ok(ConcurrencySlot { _permit: permit })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Slots not currently held.
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }
}

// ── Progress ─────────────────────────────────────────────────────────────────

/// Receives progress notifications from a running batch.
///
/// Callbacks may fire from many tasks at once and must not block.
pub trait ProgressReporter: Send + Sync {
    fn on_start(&self, _total: usize) {}
    fn on_progress(&self, _completed: usize, _total: usize) {}
    fn on_finish(&self, _completed: usize, _total: usize) {}
}

/// Reporter that ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressReporter for NoProgress {}

/// Thread-safe completion counter for one batch.
pub struct ProgressCounter {
    completed: AtomicUsize,
    total: usize,
    reporter: Arc<dyn ProgressReporter>,
}

impl ProgressCounter {
    pub fn new(total: usize, reporter: Arc<dyn ProgressReporter>) -> Self {
        Self {
            completed: AtomicUsize::new(0),
            total,
            reporter,
        }
    }

    /// Record one finished item and notify the reporter.
    ///
    /// A panicking reporter is logged and otherwise ignored; the item still
    /// counts exactly once.
    pub fn record(&self) -> usize {
        let completed = self.completed.fetch_add(1, Ordering::SeqCst) + 1;
        let notified = std::panic::catch_unwind(AssertUnwindSafe(|| {
            self.reporter.on_progress(completed, self.total)
        }));
        if let Err(panic) = notified {
            tracing::warn!(
                completed,
                message = %panic_message(panic.as_ref()),
                "progress reporter panicked"
            );
        }
        completed
    }

    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }

    pub fn total(&self) -> usize {
        self.total
    }

    /// Fraction done in `0.0..=1.0`; an empty batch counts as done.
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            self.completed() as f64 / self.total as f64
        }
    }
}

// ── Dispatcher ───────────────────────────────────────────────────────────────

/// Fans a batch of addresses out over a bounded number of concurrent lookups.
#[derive(Clone)]
pub struct BatchDispatcher {
    validator: Arc<EmailValidator>,
    limiter: ConcurrencyLimiter,
    reporter: Arc<dyn ProgressReporter>,
}

impl BatchDispatcher {
    pub fn new(validator: EmailValidator, max_concurrent: usize) -> Self {
        Self::from_shared(Arc::new(validator), max_concurrent)
    }

    pub fn from_shared(validator: Arc<EmailValidator>, max_concurrent: usize) -> Self {
        Self {
            validator,
            limiter: ConcurrencyLimiter::new(max_concurrent),
            reporter: Arc::new(NoProgress),
        }
    }

    /// Attach a progress reporter.
    pub fn with_progress(mut self, reporter: Arc<dyn ProgressReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    pub fn limiter(&self) -> &ConcurrencyLimiter {
        &self.limiter
    }

    pub fn max_concurrent(&self) -> usize {
        self.limiter.capacity()
    }

    /// Validate every address and wait for all of them.
    ///
    /// One task per address is spawned up front; the limiter throttles how
    /// many run their lookup at once. Outcomes come back in input order.
    /// If the returned future is dropped, outstanding tasks are aborted and
    /// their slots released.
    pub async fn run_batch(&self, addresses: &[String]) -> BatchResult {
        let total = addresses.len();
        self.reporter.on_start(total);

        if total == 0 {
            self.reporter.on_finish(0, 0);
            return BatchResult::new();
        }

        tracing::info!(total, max_concurrent = self.max_concurrent(), "starting batch");

        let progress = Arc::new(ProgressCounter::new(total, self.reporter.clone()));
        let mut tasks = JoinSet::new();

        for (index, address) in addresses.iter().enumerate() {
            let validator = self.validator.clone();
            let limiter = self.limiter.clone();
            let progress = progress.clone();
            let address = address.clone();

            tasks.spawn(async move {
                let outcome = validate_gated(&validator, &limiter, &progress, address).await;
                (index, outcome)
            });
        }

        let mut slots: Vec<Option<ValidationOutcome>> = vec![None; total];
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, outcome)) => slots[index] = Some(outcome),
                Err(e) => tracing::warn!(error = %e, "validation task did not complete"),
            }
        }

        let outcomes: Vec<ValidationOutcome> = slots
            .into_iter()
            .zip(addresses)
            .map(|(slot, address)| {
                slot.unwrap_or_else(|| {
                    progress.record();
                    ValidationOutcome::lookup_error(
                        address.as_str(),
                        "Validation task did not complete",
                    )
                })
            })
            .collect();

        self.reporter.on_finish(progress.completed(), total);
        tracing::info!(total, "batch finished");

        BatchResult::from(outcomes)
    }

    /// Validate addresses as a stream, yielding outcomes as they complete.
    ///
    /// At most `max_concurrent` validations are polled at a time, all on the
    /// caller's task. Useful for very large inputs or live display. The
    /// reporter sees `on_start` and `on_progress` but not `on_finish`, since
    /// the stream does not know when the caller stops polling.
    pub fn run_stream<'a>(
        &'a self,
        addresses: &'a [String],
    ) -> Pin<Box<dyn Stream<Item = ValidationOutcome> + Send + 'a>> {
        let progress = Arc::new(ProgressCounter::new(addresses.len(), self.reporter.clone()));
        self.reporter.on_start(addresses.len());

        let stream = stream::iter(addresses)
            .map(move |address| {
                let progress = progress.clone();
                async move {
                    validate_gated(&self.validator, &self.limiter, &progress, address.clone())
                        .await
                }
            })
            .buffer_unordered(self.max_concurrent());

        Box::pin(stream)
    }
}

/// Validate one address under a limiter slot, converting a panic into a
/// `LookupError` outcome. The slot is released on every path.
async fn validate_gated(
    validator: &EmailValidator,
    limiter: &ConcurrencyLimiter,
    progress: &ProgressCounter,
    address: String,
) -> ValidationOutcome {
    let _slot = match limiter.acquire().await {
        Ok(slot) => slot,
        Err(e) => {
            progress.record();
            return ValidationOutcome::lookup_error(address, e.to_string());
        }
    };

    let validated = AssertUnwindSafe(validator.validate(&address))
        .catch_unwind()
        .await;
    progress.record();

    match validated {
        Ok(outcome) => outcome,
        Err(panic) => {
            let message = panic_message(panic.as_ref());
            tracing::warn!(address = %address, message = %message, "validation panicked");
            ValidationOutcome::lookup_error(address, format!("Internal error: {}", message))
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Validate `addresses` with at most `max_concurrent` lookups in flight.
pub async fn run_batch(
    validator: Arc<EmailValidator>,
    addresses: &[String],
    max_concurrent: usize,
) -> BatchResult {
    BatchDispatcher::from_shared(validator, max_concurrent)
        .run_batch(addresses)
        .await
}
