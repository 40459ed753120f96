//! Email Verify CLI Application
//!
//! A command-line interface for validating email addresses by syntax and MX
//! records. This CLI application provides a user-friendly interface to the
//! email-verify-lib library.

mod ui;

use clap::builder::styling::{AnsiColor, Effects, Styles};
use clap::Parser;
use email_verify_lib::{
    load_env_config, parse_timeout_string, read_addresses_from_file, ConfigManager, EnvConfig,
    FileConfig, MAX_ATTEMPTS, MAX_CONCURRENT_LIMIT,
};
use email_verify_lib::{BatchResult, EmailChecker, NameserverChoice, Report, ValidateConfig};
use serde::Serialize;
use std::process;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const STYLES: Styles = Styles::styled()
    .header(AnsiColor::Yellow.on_default().effects(Effects::BOLD))
    .usage(AnsiColor::Yellow.on_default().effects(Effects::BOLD))
    .literal(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .placeholder(AnsiColor::Cyan.on_default());

/// CLI arguments for email-verify
#[derive(Parser, Debug)]
#[command(name = "email-verify")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Validate email addresses by syntax and MX records")]
#[command(
    long_about = "Validate email addresses by syntax and MX records.\n\nAddresses that pass the format check are looked up concurrently, with a hard cap on in-flight DNS queries."
)]
#[command(styles = STYLES)]
pub struct Args {
    /// Email addresses to validate
    #[arg(value_name = "ADDRESSES", help_heading = "Input")]
    pub addresses: Vec<String>,

    /// Input file with addresses (one per line, '#' starts a comment)
    #[arg(short = 'f', long = "file", value_name = "FILE", help_heading = "Input")]
    pub file: Option<String>,

    /// Output results in JSON format
    #[arg(short = 'j', long = "json", help_heading = "Output Format")]
    pub json: bool,

    /// Output results in CSV format
    #[arg(long = "csv", help_heading = "Output Format")]
    pub csv: bool,

    /// Show a header, every result line and a per-kind breakdown
    #[arg(short = 'p', long = "pretty", help_heading = "Output Format")]
    pub pretty: bool,

    /// Collect all results before displaying
    #[arg(long = "batch", help_heading = "Output Format")]
    pub batch: bool,

    /// Show results as they complete
    #[arg(long = "streaming", help_heading = "Output Format")]
    pub streaming: bool,

    /// Max concurrent DNS lookups (default: 100, max: 1000)
    #[arg(
        short = 'c',
        long = "max-concurrent",
        visible_alias = "concurrency",
        value_name = "N",
        help_heading = "Performance"
    )]
    pub max_concurrent: Option<usize>,

    /// Per-query DNS timeout, e.g. "5s" or "1m" (default: 5s)
    #[arg(long = "timeout", value_name = "DURATION", help_heading = "Performance")]
    pub timeout: Option<String>,

    /// Nameservers to query: system, google, cloudflare, quad9
    #[arg(long = "resolver", value_name = "NAME", help_heading = "DNS")]
    pub resolver: Option<String>,

    /// Resolver attempts per query (default: 2)
    #[arg(long = "attempts", value_name = "N", help_heading = "DNS")]
    pub attempts: Option<usize>,

    /// Use specific config file instead of automatic discovery
    #[arg(long = "config", value_name = "FILE", help_heading = "Configuration")]
    pub config: Option<String>,

    /// Show debug logs on stderr
    #[arg(short = 'd', long = "debug", help_heading = "Configuration")]
    pub debug: bool,

    /// Verbose logging
    #[arg(short = 'v', long = "verbose", help_heading = "Configuration")]
    pub verbose: bool,
}

/// How the final results are rendered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
enum OutputFormat {
    #[default]
    Text,
    Json,
    Csv,
}

impl OutputFormat {
    fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "text" => Some(OutputFormat::Text),
            "json" => Some(OutputFormat::Json),
            "csv" => Some(OutputFormat::Csv),
            _ => None,
        }
    }

    fn is_structured(self) -> bool {
        self != OutputFormat::Text
    }
}

/// Settings resolved from defaults, config files, environment and CLI.
#[derive(Debug, Clone, Default)]
struct RunConfig {
    validate: ValidateConfig,
    format: OutputFormat,
    file: Option<String>,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // Validate arguments
    if let Err(e) = validate_args(&args) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }

    init_logging(&args);
    tracing::info!("email-verify v{} starting", env!("CARGO_PKG_VERSION"));

    if let Err(e) = run_email_verify(args).await {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

/// Install the stderr log subscriber. `RUST_LOG` overrides the flags.
fn init_logging(args: &Args) {
    let level = if args.debug {
        "debug"
    } else if args.verbose {
        "info"
    } else {
        "warn"
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "email_verify={level},email_verify_lib={level},warn",
            level = level
        ))
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .compact(),
        )
        .init();
}

/// Validate command line arguments
fn validate_args(args: &Args) -> Result<(), String> {
    // Can't have conflicting output modes
    if args.batch && args.streaming {
        return Err("Cannot specify both --batch and --streaming modes".to_string());
    }

    // Can't have multiple output formats
    if args.json && args.csv {
        return Err("Cannot specify multiple output formats (--json, --csv)".to_string());
    }

    // Streaming mode doesn't support structured output formats
    if args.streaming && (args.json || args.csv) {
        return Err(
            "Cannot use --streaming with --json or --csv. Use --batch for structured output"
                .to_string(),
        );
    }

    if let Some(n) = args.max_concurrent {
        if n == 0 || n > MAX_CONCURRENT_LIMIT {
            return Err(format!(
                "Max concurrent lookups must be between 1 and {}",
                MAX_CONCURRENT_LIMIT
            ));
        }
    }

    if let Some(timeout) = &args.timeout {
        if timeout_from_str(timeout).is_none() {
            return Err(format!(
                "Invalid timeout '{}'. Use format like '5s', '30s', '2m'",
                timeout
            ));
        }
    }

    if let Some(resolver) = &args.resolver {
        resolver.parse::<NameserverChoice>()?;
    }

    if let Some(attempts) = args.attempts {
        if attempts == 0 || attempts > MAX_ATTEMPTS {
            return Err(format!("Attempts must be between 1 and {}", MAX_ATTEMPTS));
        }
    }

    Ok(())
}

/// Main validation logic
async fn run_email_verify(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let run = build_config(&args)?;

    if args.streaming && run.format.is_structured() {
        return Err("Cannot use --streaming with JSON or CSV output".into());
    }

    let addresses = get_addresses_to_check(&args, &run)?;
    tracing::info!(
        count = addresses.len(),
        max_concurrent = run.validate.max_concurrent,
        timeout = ?run.validate.query_timeout,
        resolver = %run.validate.nameserver,
        "validating addresses"
    );

    let mut checker = EmailChecker::with_config(run.validate.clone())?;

    if should_use_streaming(&args, run.format, addresses.len()) {
        run_streaming_check(&checker, &addresses, &args).await
    } else {
        if !run.format.is_structured() && addresses.len() > 1 {
            checker = checker.with_progress(Arc::new(ui::ProgressLine::new()));
        }
        run_batch_check(&checker, &addresses, &args, run.format).await
    }
}

/// Determine whether to use streaming or batch mode
fn should_use_streaming(args: &Args, format: OutputFormat, address_count: usize) -> bool {
    // Force batch mode if explicitly requested
    if args.batch {
        return false;
    }

    // Force streaming mode if explicitly requested
    if args.streaming {
        return true;
    }

    // Pretty text output for several addresses streams by default
    args.pretty && address_count > 1 && !format.is_structured()
}

/// Run validation in streaming mode, printing each outcome as it lands
async fn run_streaming_check(
    checker: &EmailChecker,
    addresses: &[String],
    args: &Args,
) -> Result<(), Box<dyn std::error::Error>> {
    use futures::StreamExt;

    if args.pretty {
        ui::print_header(addresses.len(), checker.config().max_concurrent);
    }

    let total = addresses.len();
    let mut outcomes = Vec::with_capacity(total);
    let start_time = Instant::now();

    let mut stream = checker.validate_emails_stream(addresses);
    while let Some(outcome) = stream.next().await {
        let counter = if total > 1 {
            Some((outcomes.len() + 1, total))
        } else {
            None
        };
        ui::print_outcome(&outcome, counter);
        outcomes.push(outcome);
    }

    let duration = start_time.elapsed();
    let report = checker.summarize(&BatchResult::from(outcomes));

    ui::print_report(&report, duration);
    if args.pretty {
        ui::print_breakdown(&report);
    }

    Ok(())
}

/// Run validation in batch mode (collect all results first)
async fn run_batch_check(
    checker: &EmailChecker,
    addresses: &[String],
    args: &Args,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    if args.pretty && !format.is_structured() {
        ui::print_header(addresses.len(), checker.config().max_concurrent);
    }

    let start_time = Instant::now();
    let batch = checker.validate_emails(addresses).await;
    let duration = start_time.elapsed();

    let report = checker.summarize(&batch);
    display_results(&batch, &report, args, format, duration)
}

/// Build the run configuration with config file integration.
///
/// Precedence order (highest to lowest):
/// 1. CLI arguments (explicit user input)
/// 2. Environment variables (EV_*)
/// 3. Local config file (./email-verify.toml)
/// 4. Global config file (~/.email-verify.toml)
/// 5. XDG config file (~/.config/email-verify/config.toml)
/// 6. Built-in defaults
fn build_config(args: &Args) -> Result<RunConfig, Box<dyn std::error::Error>> {
    let env_config = load_env_config();
    let file_config = load_file_config(args, &env_config)?;
    Ok(resolve_config(args, file_config, &env_config))
}

/// Load the explicit config file if one was named, otherwise discover.
fn load_file_config(
    args: &Args,
    env_config: &EnvConfig,
) -> Result<FileConfig, Box<dyn std::error::Error>> {
    let config_manager = ConfigManager::new();

    let explicit = args
        .config
        .as_ref()
        .map(|path| (path, "--config"))
        .or_else(|| env_config.config.as_ref().map(|path| (path, "EV_CONFIG")));

    match explicit {
        Some((path, source)) => {
            tracing::info!("Using explicit config file ({}): {}", source, path);
            config_manager
                .load_file(path)
                .map_err(|e| format!("Failed to load config file '{}': {}", path, e).into())
        }
        None => Ok(config_manager.discover_and_load()?),
    }
}

fn resolve_config(args: &Args, file_config: FileConfig, env_config: &EnvConfig) -> RunConfig {
    let mut run = RunConfig::default();
    apply_file_config(&mut run, file_config);
    apply_environment_config(&mut run, env_config);
    apply_cli_args(&mut run, args);
    run
}

/// Merge FileConfig into the run configuration
fn apply_file_config(run: &mut RunConfig, file_config: FileConfig) {
    if let Some(defaults) = file_config.defaults {
        if let Some(n) = defaults.max_concurrent {
            run.validate = run.validate.clone().with_max_concurrent(n);
        }
        if let Some(timeout) = defaults.timeout.as_deref().and_then(timeout_from_str) {
            run.validate.query_timeout = timeout;
        }
        if let Some(choice) = defaults.resolver.and_then(|r| r.parse().ok()) {
            run.validate.nameserver = choice;
        }
        if let Some(attempts) = defaults.attempts {
            run.validate = run.validate.clone().with_attempts(attempts);
        }
    }

    if let Some(format) = file_config
        .output
        .and_then(|o| o.default_format)
        .and_then(|f| OutputFormat::from_name(&f))
    {
        run.format = format;
    }
}

/// Apply EV_* environment values (already validated by the library)
fn apply_environment_config(run: &mut RunConfig, env_config: &EnvConfig) {
    if let Some(n) = env_config.max_concurrent {
        run.validate = run.validate.clone().with_max_concurrent(n);
    }
    if let Some(timeout) = env_config.timeout.as_deref().and_then(timeout_from_str) {
        run.validate.query_timeout = timeout;
    }
    if let Some(choice) = env_config.resolver {
        run.validate.nameserver = choice;
    }
    if let Some(attempts) = env_config.attempts {
        run.validate = run.validate.clone().with_attempts(attempts);
    }

    if env_config.has_output_format_conflict() {
        tracing::warn!("Both EV_JSON and EV_CSV are set to true, ignoring both");
    } else if env_config.json == Some(true) {
        run.format = OutputFormat::Json;
    } else if env_config.csv == Some(true) {
        run.format = OutputFormat::Csv;
    }

    if env_config.file.is_some() {
        run.file = env_config.file.clone();
    }
}

/// Apply CLI arguments to config (highest precedence).
fn apply_cli_args(run: &mut RunConfig, args: &Args) {
    if let Some(n) = args.max_concurrent {
        run.validate = run.validate.clone().with_max_concurrent(n);
    }
    if let Some(timeout) = args.timeout.as_deref().and_then(timeout_from_str) {
        run.validate.query_timeout = timeout;
    }
    if let Some(choice) = args.resolver.as_deref().and_then(|r| r.parse().ok()) {
        run.validate.nameserver = choice;
    }
    if let Some(attempts) = args.attempts {
        run.validate = run.validate.clone().with_attempts(attempts);
    }

    if args.json {
        run.format = OutputFormat::Json;
    } else if args.csv {
        run.format = OutputFormat::Csv;
    }

    if args.file.is_some() {
        run.file = args.file.clone();
    }
}

/// Parse a positive timeout like "5s" or "2m".
fn timeout_from_str(value: &str) -> Option<Duration> {
    parse_timeout_string(value)
        .filter(|secs| *secs > 0)
        .map(Duration::from_secs)
}

/// Collect addresses from the command line and the input file, in that order.
fn get_addresses_to_check(
    args: &Args,
    run: &RunConfig,
) -> Result<Vec<String>, Box<dyn std::error::Error>> {
    let mut addresses = args.addresses.clone();

    if let Some(path) = &run.file {
        let from_file = read_addresses_from_file(path)?;
        tracing::info!(path = %path, count = from_file.len(), "read addresses from file");
        addresses.extend(from_file);
    }

    if addresses.is_empty() {
        return Err("You must specify email addresses or a file with --file".into());
    }

    Ok(addresses)
}

fn display_results(
    batch: &BatchResult,
    report: &Report,
    args: &Args,
    format: OutputFormat,
    duration: Duration,
) -> Result<(), Box<dyn std::error::Error>> {
    match format {
        OutputFormat::Json => display_json_results(batch, report)?,
        OutputFormat::Csv => display_csv_results(batch),
        OutputFormat::Text => display_text_results(batch, report, args, duration),
    }

    Ok(())
}

#[derive(Serialize)]
struct JsonOutput<'a> {
    report: &'a Report,
    outcomes: &'a BatchResult,
}

/// Display results in JSON format
fn display_json_results(
    batch: &BatchResult,
    report: &Report,
) -> Result<(), Box<dyn std::error::Error>> {
    let json = serde_json::to_string_pretty(&JsonOutput {
        report,
        outcomes: batch,
    })?;
    println!("{}", json);
    Ok(())
}

/// Display results in CSV format
fn display_csv_results(batch: &BatchResult) {
    println!("address,status,reason");

    for outcome in batch {
        println!(
            "{},{},{}",
            csv_field(&outcome.address),
            outcome.status,
            csv_field(&outcome.reason)
        );
    }
}

/// Quote a CSV field if it contains a delimiter, quote or newline.
fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Display results in human-readable text format
fn display_text_results(batch: &BatchResult, report: &Report, args: &Args, duration: Duration) {
    if args.pretty {
        for outcome in batch {
            ui::print_outcome(outcome, None);
        }
    }

    ui::print_report(report, duration);

    if args.pretty {
        ui::print_breakdown(report);
    }
}
