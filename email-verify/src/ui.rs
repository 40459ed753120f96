//! Display logic for the email-verify CLI.
//!
//! Result lines, the live progress line, headers and the final report.
//! Uses only the `console` crate.

use console::{pad_str, style, Alignment, Term};
use email_verify_lib::{OutcomeKind, ProgressReporter, Report, ValidationOutcome};
use std::sync::Mutex;
use std::time::Duration;

// ── Progress line ────────────────────────────────────────────────────────────

/// Live "n/total" counter on stderr, so stdout stays clean.
///
/// Does nothing when stderr is not a terminal. Callbacks arrive from many
/// tasks at once, so each redraw holds `draw` for its clear and write.
pub struct ProgressLine {
    term: Term,
    enabled: bool,
    draw: Mutex<()>,
}

impl ProgressLine {
    pub fn new() -> Self {
        let term = Term::stderr();
        let enabled = term.is_term();
        Self {
            term,
            enabled,
            draw: Mutex::new(()),
        }
    }
}

impl ProgressReporter for ProgressLine {
    fn on_start(&self, total: usize) {
        if self.enabled && total > 0 {
            let _guard = self.draw.lock().unwrap_or_else(|e| e.into_inner());
            let _ = self
                .term
                .write_str(&format!("{} Validating {} addresses...", style("⠋").cyan(), total));
        }
    }

    fn on_progress(&self, completed: usize, total: usize) {
        if self.enabled {
            let _guard = self.draw.lock().unwrap_or_else(|e| e.into_inner());
            let _ = self.term.clear_line();
            let _ = self.term.write_str(&format!(
                "{} Validating addresses {}",
                style("⠿").cyan(),
                style(format!("[{}/{}]", completed, total)).dim()
            ));
        }
    }

    fn on_finish(&self, _completed: usize, _total: usize) {
        if self.enabled {
            let _guard = self.draw.lock().unwrap_or_else(|e| e.into_inner());
            let _ = self.term.clear_line();
        }
    }
}

// ── Header ───────────────────────────────────────────────────────────────────

/// Print a styled header at the start of a pretty run.
pub fn print_header(address_count: usize, max_concurrent: usize) {
    println!(
        "{} {} {}",
        style("email-verify").bold(),
        style(format!("v{}", env!("CARGO_PKG_VERSION"))).dim(),
        style(format!(
            "- Validating {} address{}",
            address_count,
            if address_count == 1 { "" } else { "es" }
        ))
        .dim(),
    );
    println!(
        "{}",
        style(format!("Max concurrent lookups: {}", max_concurrent)).dim()
    );
    println!();
}

// ── Single result line ───────────────────────────────────────────────────────

/// Short label shown next to each address.
pub fn status_label(status: OutcomeKind) -> &'static str {
    match status {
        OutcomeKind::Valid => "VALID",
        OutcomeKind::InvalidFormat => "BAD FORMAT",
        OutcomeKind::NoMailExchange => "NO MX",
        OutcomeKind::LookupError => "ERROR",
    }
}

/// Print one outcome with colors and alignment.
///
/// If `counter` is Some((current, total)), a progress prefix like `[3/8]` is shown.
pub fn print_outcome(outcome: &ValidationOutcome, counter: Option<(usize, usize)>) {
    let address_width = 40;
    let padded = pad_str(&outcome.address, address_width, Alignment::Left, Some(".."));

    let prefix = match counter {
        Some((cur, total)) => format!("{} ", style(format!("[{}/{}]", cur, total)).dim()),
        None => String::new(),
    };

    let label = status_label(outcome.status);
    let label = match outcome.status {
        OutcomeKind::Valid => style(label).green().bold(),
        OutcomeKind::InvalidFormat => style(label).yellow(),
        OutcomeKind::NoMailExchange => style(label).red(),
        OutcomeKind::LookupError => style(label).magenta(),
    };

    if outcome.status == OutcomeKind::LookupError {
        println!(
            "  {}{}  {} {}",
            prefix,
            padded,
            label,
            style(format!("({})", outcome.reason)).dim()
        );
    } else {
        println!("  {}{}  {}", prefix, padded, label);
    }
}

// ── Report ───────────────────────────────────────────────────────────────────

/// Plain-text report: counts, success rate and the failure listing.
pub fn format_report(report: &Report) -> String {
    let mut out = String::new();
    out.push_str("Validation Results:\n");
    out.push_str(&format!("Total emails: {}\n", report.total));
    out.push_str(&format!("Valid emails: {}\n", report.valid));
    out.push_str(&format!("Invalid emails: {}\n", report.invalid));
    out.push_str(&format!("Success rate: {:.1}%\n", report.success_rate));

    if !report.failures.is_empty() {
        out.push_str(&format!("\nFailed emails ({}):\n", report.failures.len()));
        for failure in &report.failures {
            out.push_str(&format!("  {}: {}\n", failure.address, failure.reason));
        }
    }

    out
}

/// Print the final report, followed by a dim timing line.
pub fn print_report(report: &Report, duration: Duration) {
    println!();
    print!("{}", format_report(report));
    println!(
        "{}",
        style(format!(
            "\nChecked {} address{} in {:.1}s",
            report.total,
            if report.total == 1 { "" } else { "es" },
            duration.as_secs_f64()
        ))
        .dim()
    );
}

/// Print the per-kind breakdown used in pretty mode.
pub fn print_breakdown(report: &Report) {
    let b = &report.breakdown;
    println!(
        "  {}  {}  {}  {}  {}",
        style(format!("{} bad format", b.invalid_format)).yellow(),
        style("|").dim(),
        style(format!("{} no MX", b.no_mail_exchange)).red(),
        style("|").dim(),
        style(format!("{} errors", b.lookup_error)).magenta(),
    );
}

// ── Tests ────────────────────────────────────────────────────────────────────
