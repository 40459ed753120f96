// email-verify-lib/tests/integration.rs

//! Integration tests for batch validation through the public API,
//! using stub resolvers so nothing touches the network.

use async_trait::async_trait;
use email_verify_lib::{
    run_batch, summarize, BatchDispatcher, DomainResolver, EmailChecker, EmailValidator,
    MxRecord, MxResolver, OutcomeKind, ProgressReporter, ValidateConfig, ValidationError,
};
use futures::StreamExt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Stub that knows a few domains, counts calls and tracks peak concurrency.
#[derive(Default)]
struct InstrumentedResolver {
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
    delay: Duration,
}

impl InstrumentedResolver {
    fn with_delay(delay: Duration) -> Self {
        Self {
            delay,
            ..Default::default()
        }
    }

    fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MxResolver for InstrumentedResolver {
    async fn lookup_mx(&self, domain: &str) -> Result<Vec<MxRecord>, ValidationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let answer = match domain {
            "example.com" => Ok(vec![MxRecord::new(10, "mx.example.com")]),
            "servfail.test" => Err(ValidationError::dns(domain, "SERVFAIL")),
            "boom.test" => {
                self.in_flight.fetch_sub(1, Ordering::SeqCst);
                panic!("resolver exploded for {}", domain);
            }
            _ => Ok(vec![]),
        };

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        answer
    }
}

/// Stub that never answers in time.
struct HangingResolver;

#[async_trait]
impl MxResolver for HangingResolver {
    async fn lookup_mx(&self, _domain: &str) -> Result<Vec<MxRecord>, ValidationError> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok(vec![MxRecord::new(10, "mx.late.test")])
    }
}

fn dispatcher(stub: Arc<dyn MxResolver>, max_concurrent: usize) -> BatchDispatcher {
    let resolver = DomainResolver::new(stub, Duration::from_secs(5));
    BatchDispatcher::new(EmailValidator::new(resolver), max_concurrent)
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[tokio::test]
async fn test_three_address_scenario() {
    let stub = Arc::new(InstrumentedResolver::default());
    let batch = dispatcher(stub.clone(), 10)
        .run_batch(&strings(&[
            "good@example.com",
            "bad-format",
            "nouser@no-mx-domain.test",
        ]))
        .await;

    assert_eq!(batch.len(), 3);
    assert_eq!(batch.get("good@example.com").unwrap().status, OutcomeKind::Valid);
    assert_eq!(batch.get("bad-format").unwrap().status, OutcomeKind::InvalidFormat);
    assert_eq!(
        batch.get("nouser@no-mx-domain.test").unwrap().status,
        OutcomeKind::NoMailExchange
    );

    let report = summarize(&batch);
    assert_eq!(report.total, 3);
    assert_eq!(report.valid, 1);
    assert_eq!(report.invalid, 2);
    assert!((report.success_rate - 33.3).abs() < 0.1);
    assert_eq!(report.failures.len(), 2);

    // The malformed address never reached the resolver
    assert_eq!(stub.calls(), 2);
}

#[tokio::test]
async fn test_empty_batch() {
    let stub = Arc::new(InstrumentedResolver::default());
    let batch = dispatcher(stub.clone(), 10).run_batch(&[]).await;

    assert!(batch.is_empty());
    assert_eq!(summarize(&batch).success_rate, 0.0);
    assert_eq!(stub.calls(), 0);
}

#[tokio::test]
async fn test_one_outcome_per_input_with_duplicates() {
    let stub = Arc::new(InstrumentedResolver::default());
    let mut addresses = strings(&["dup@example.com", "dup@example.com", "x@nomx.test"]);
    for i in 0..50 {
        addresses.push(format!("user{}@example.com", i));
    }

    let batch = dispatcher(stub, 7).run_batch(&addresses).await;

    assert_eq!(batch.len(), addresses.len());
    let returned: Vec<&str> = batch.iter().map(|o| o.address.as_str()).collect();
    let expected: Vec<&str> = addresses.iter().map(String::as_str).collect();
    assert_eq!(returned, expected);
    assert_eq!(batch.count(OutcomeKind::Valid), addresses.len() - 1);
}

#[tokio::test]
async fn test_invalid_format_makes_no_lookups() {
    let stub = Arc::new(InstrumentedResolver::default());
    let batch = dispatcher(stub.clone(), 4)
        .run_batch(&strings(&["", "nope", "@example.com", "user@", "a b@example.com"]))
        .await;

    assert_eq!(batch.count(OutcomeKind::InvalidFormat), 5);
    assert_eq!(stub.calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_peak_concurrency_is_bounded() {
    let stub = Arc::new(InstrumentedResolver::with_delay(Duration::from_millis(20)));
    let addresses: Vec<String> = (0..40).map(|i| format!("u{}@example.com", i)).collect();

    let batch = dispatcher(stub.clone(), 5).run_batch(&addresses).await;

    assert_eq!(batch.len(), 40);
    assert_eq!(stub.calls(), 40);
    assert!(stub.peak() <= 5, "peak was {}", stub.peak());
}

#[tokio::test(start_paused = true)]
async fn test_single_slot_serializes_lookups() {
    let stub = Arc::new(InstrumentedResolver::with_delay(Duration::from_millis(10)));
    let addresses: Vec<String> = (0..5).map(|i| format!("u{}@example.com", i)).collect();

    let batch = dispatcher(stub.clone(), 1).run_batch(&addresses).await;

    assert_eq!(batch.len(), 5);
    assert_eq!(stub.peak(), 1);
}

#[tokio::test]
async fn test_resolver_error_is_no_mail_exchange() {
    let stub = Arc::new(InstrumentedResolver::default());
    let batch = dispatcher(stub, 2)
        .run_batch(&strings(&["a@servfail.test"]))
        .await;

    let outcome = batch.get("a@servfail.test").unwrap();
    assert_eq!(outcome.status, OutcomeKind::NoMailExchange);
    assert_eq!(outcome.reason, "No MX records");
}

#[tokio::test]
async fn test_panic_becomes_lookup_error_and_slots_return() {
    let stub = Arc::new(InstrumentedResolver::default());
    let dispatcher = dispatcher(stub, 3);

    let mut addresses = Vec::new();
    for i in 0..10 {
        addresses.push(format!("ok{}@example.com", i));
        addresses.push(format!("bad{}@boom.test", i));
    }

    let batch = dispatcher.run_batch(&addresses).await;

    assert_eq!(batch.len(), 20);
    assert_eq!(batch.count(OutcomeKind::Valid), 10);
    assert_eq!(batch.count(OutcomeKind::LookupError), 10);

    let failed = batch.get("bad0@boom.test").unwrap();
    assert!(failed.reason.contains("resolver exploded"));

    assert_eq!(dispatcher.limiter().available(), dispatcher.limiter().capacity());
}

#[tokio::test(start_paused = true)]
async fn test_timeout_is_no_mail_exchange() {
    let resolver = DomainResolver::new(Arc::new(HangingResolver), Duration::from_secs(2));
    let dispatcher = BatchDispatcher::new(EmailValidator::new(resolver), 2);

    let batch = dispatcher
        .run_batch(&strings(&["a@slow.test", "b@slow.test", "c@slow.test"]))
        .await;

    assert_eq!(batch.count(OutcomeKind::NoMailExchange), 3);
    assert_eq!(dispatcher.limiter().available(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_dropped_batch_releases_slots() {
    let resolver = DomainResolver::new(Arc::new(HangingResolver), Duration::from_secs(600));
    let dispatcher = BatchDispatcher::new(EmailValidator::new(resolver), 2);
    let addresses = strings(&["a@slow.test", "b@slow.test", "c@slow.test"]);

    let cancelled =
        tokio::time::timeout(Duration::from_secs(1), dispatcher.run_batch(&addresses)).await;
    assert!(cancelled.is_err());

    // Aborted tasks are dropped by the runtime shortly after
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(dispatcher.limiter().available(), 2);
}

#[tokio::test]
async fn test_stream_yields_one_outcome_per_input() {
    let stub = Arc::new(InstrumentedResolver::default());
    let dispatcher = dispatcher(stub, 3);
    let addresses = strings(&[
        "a@example.com",
        "bad-format",
        "c@nomx.test",
        "d@boom.test",
        "a@example.com",
    ]);

    let outcomes: Vec<_> = dispatcher.run_stream(&addresses).collect().await;

    assert_eq!(outcomes.len(), addresses.len());
    let lookup_errors = outcomes
        .iter()
        .filter(|o| o.status == OutcomeKind::LookupError)
        .count();
    assert_eq!(lookup_errors, 1);
    assert_eq!(dispatcher.limiter().available(), 3);
}

#[derive(Default)]
struct Recorder {
    started: Mutex<Option<usize>>,
    progress: AtomicUsize,
    finished: Mutex<Option<(usize, usize)>>,
}

impl ProgressReporter for Recorder {
    fn on_start(&self, total: usize) {
        *self.started.lock().unwrap() = Some(total);
    }

    fn on_progress(&self, _completed: usize, _total: usize) {
        self.progress.fetch_add(1, Ordering::SeqCst);
    }

    fn on_finish(&self, completed: usize, total: usize) {
        *self.finished.lock().unwrap() = Some((completed, total));
    }
}

#[tokio::test]
async fn test_progress_reporter_sees_every_item() {
    let recorder = Arc::new(Recorder::default());
    let stub = Arc::new(InstrumentedResolver::default());
    let dispatcher = dispatcher(stub, 4).with_progress(recorder.clone());

    let addresses = strings(&["a@example.com", "bad", "c@boom.test", "d@nomx.test"]);
    dispatcher.run_batch(&addresses).await;

    assert_eq!(*recorder.started.lock().unwrap(), Some(4));
    assert_eq!(recorder.progress.load(Ordering::SeqCst), 4);
    assert_eq!(*recorder.finished.lock().unwrap(), Some((4, 4)));
}

/// Reporter whose first `on_progress` call panics.
#[derive(Default)]
struct FlakyReporter {
    calls: AtomicUsize,
    max_completed: AtomicUsize,
    finished: Mutex<Option<(usize, usize)>>,
}

impl ProgressReporter for FlakyReporter {
    fn on_progress(&self, completed: usize, _total: usize) {
        self.max_completed.fetch_max(completed, Ordering::SeqCst);
        if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
            panic!("display went away");
        }
    }

    fn on_finish(&self, completed: usize, total: usize) {
        *self.finished.lock().unwrap() = Some((completed, total));
    }
}

#[tokio::test]
async fn test_panicking_reporter_keeps_outcomes_and_count() {
    let reporter = Arc::new(FlakyReporter::default());
    let stub = Arc::new(InstrumentedResolver::default());
    let dispatcher = dispatcher(stub, 2).with_progress(reporter.clone());
    let addresses = strings(&[
        "a@example.com",
        "b@example.com",
        "c@example.com",
        "d@example.com",
    ]);

    let batch = dispatcher.run_batch(&addresses).await;

    assert_eq!(batch.len(), 4);
    assert_eq!(batch.count(OutcomeKind::Valid), 4);
    assert_eq!(reporter.calls.load(Ordering::SeqCst), 4);
    assert_eq!(reporter.max_completed.load(Ordering::SeqCst), 4);
    assert_eq!(*reporter.finished.lock().unwrap(), Some((4, 4)));
    assert_eq!(dispatcher.limiter().available(), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_run_batch_on_multi_thread_runtime() {
    let stub = Arc::new(InstrumentedResolver::with_delay(Duration::from_millis(5)));
    let resolver = DomainResolver::new(stub.clone(), Duration::from_secs(5));
    let validator = Arc::new(EmailValidator::new(resolver));
    let addresses: Vec<String> = (0..100).map(|i| format!("u{}@example.com", i)).collect();

    let batch = run_batch(validator, &addresses, 8).await;

    assert_eq!(batch.len(), 100);
    assert_eq!(batch.count(OutcomeKind::Valid), 100);
    assert!(stub.peak() <= 8, "peak was {}", stub.peak());
}

#[tokio::test]
async fn test_checker_with_zero_concurrency_still_runs() {
    let config = ValidateConfig {
        max_concurrent: 0,
        ..Default::default()
    };
    let checker = EmailChecker::with_resolver(config, Arc::new(InstrumentedResolver::default()));

    let batch = checker
        .validate_emails(&strings(&["a@example.com", "b@example.com"]))
        .await;
    assert_eq!(batch.count(OutcomeKind::Valid), 2);
}
