//! Aggregate statistics over a finished batch.

use crate::types::{BatchResult, FailureEntry, OutcomeBreakdown, OutcomeKind, Report};

/// Summarize a batch: counts, success rate and the failure listing.
///
/// `success_rate` is a percentage and is `0.0` for an empty batch.
/// Failures keep the order of the batch.
pub fn summarize(batch: &BatchResult) -> Report {
    let total = batch.len();
    let mut valid = 0;
    let mut failures = Vec::new();
    let mut breakdown = OutcomeBreakdown::default();

    for outcome in batch {
        match outcome.status {
            OutcomeKind::Valid => {
                valid += 1;
                continue;
            }
            OutcomeKind::InvalidFormat => breakdown.invalid_format += 1,
            OutcomeKind::NoMailExchange => breakdown.no_mail_exchange += 1,
            OutcomeKind::LookupError => breakdown.lookup_error += 1,
        }
        failures.push(FailureEntry {
            address: outcome.address.clone(),
            reason: outcome.reason.clone(),
        });
    }

    let success_rate = if total == 0 {
        0.0
    } else {
        valid as f64 / total as f64 * 100.0
    };

    Report {
        total,
        valid,
        invalid: total - valid,
        success_rate,
        failures,
        breakdown,
    }
}
