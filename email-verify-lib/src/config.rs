//! Configuration file parsing and management.
//!
//! This module handles loading configuration from TOML files and `EV_*`
//! environment variables, and merging configurations with proper
//! precedence rules.

use crate::error::ValidationError;
use crate::types::{NameserverChoice, MAX_CONCURRENT_LIMIT};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Largest resolver attempt count accepted from files or the environment.
pub const MAX_ATTEMPTS: usize = 10;

/// Output formats understood by `[output] default_format`.
const OUTPUT_FORMATS: [&str; 3] = ["text", "json", "csv"];

/// Configuration loaded from TOML files.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FileConfig {
    /// Default values for CLI options
    #[serde(skip_serializing_if = "Option::is_none")]
    pub defaults: Option<DefaultsConfig>,

    /// Output formatting preferences
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<OutputConfig>,
}

/// Default configuration values that map to CLI options.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DefaultsConfig {
    /// Default cap on concurrent lookups
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_concurrent: Option<usize>,

    /// Default timeout (as string, e.g., "5s", "30s")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<String>,

    /// Nameserver set: system, google, cloudflare or quad9
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolver: Option<String>,

    /// Resolver attempts per query
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attempts: Option<usize>,
}

/// Output formatting configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct OutputConfig {
    /// Default output format: text, json or csv
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_format: Option<String>,
}

/// Configuration discovery and loading functionality.
#[derive(Debug, Default)]
pub struct ConfigManager;

impl ConfigManager {
    pub fn new() -> Self {
        Self
    }

    /// Load configuration from a specific file.
    ///
    /// The file must exist, parse as TOML and pass validation.
    pub fn load_file<P: AsRef<Path>>(&self, path: P) -> Result<FileConfig, ValidationError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ValidationError::file_error(
                path.to_string_lossy(),
                "Configuration file not found",
            ));
        }

        let content = fs::read_to_string(path).map_err(|e| {
            ValidationError::file_error(
                path.to_string_lossy(),
                format!("Failed to read configuration file: {}", e),
            )
        })?;

        let config: FileConfig = toml::from_str(&content)?;

        self.validate_config(&config)?;

        Ok(config)
    }

    /// Discover and load configuration files in precedence order.
    ///
    /// XDG config is loaded first, then the global file in `$HOME`, then the
    /// local file in the working directory; later files win. A file that
    /// fails to load is skipped with a warning.
    pub fn discover_and_load(&self) -> Result<FileConfig, ValidationError> {
        let mut merged_config = FileConfig::default();
        let mut loaded_files = Vec::new();

        let candidates = [
            self.get_xdg_config_path(),
            self.get_global_config_path(),
            self.get_local_config_path(),
        ];

        for path in candidates.into_iter().flatten() {
            match self.load_file(&path) {
                Ok(config) => {
                    merged_config = self.merge_configs(merged_config, config);
                    loaded_files.push(path);
                }
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "skipping config file");
                }
            }
        }

        if loaded_files.len() > 1 {
            tracing::info!(
                files = ?loaded_files,
                "multiple config files found, later files take precedence"
            );
        } else if let Some(path) = loaded_files.first() {
            tracing::debug!(path = %path.display(), "loaded config file");
        }

        Ok(merged_config)
    }

    /// Local configuration file in the current directory.
    fn get_local_config_path(&self) -> Option<PathBuf> {
        let candidates = ["./email-verify.toml", "./.email-verify.toml"];

        candidates
            .iter()
            .map(Path::new)
            .find(|path| path.exists())
            .map(Path::to_path_buf)
    }

    /// Global configuration file in the user's home directory.
    fn get_global_config_path(&self) -> Option<PathBuf> {
        let home = env::var_os("HOME")?;
        let candidates = [".email-verify.toml", "email-verify.toml"];

        candidates
            .iter()
            .map(|candidate| Path::new(&home).join(candidate))
            .find(|path| path.exists())
    }

    /// XDG configuration file, following the XDG Base Directory layout.
    fn get_xdg_config_path(&self) -> Option<PathBuf> {
        let config_dir = env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| env::var_os("HOME").map(|home| Path::new(&home).join(".config")))?;

        let path = config_dir.join("email-verify").join("config.toml");
        if path.exists() {
            Some(path)
        } else {
            None
        }
    }

    /// Merge two configurations with proper precedence.
    ///
    /// Values from `higher` take precedence over values from `lower`.
    pub fn merge_configs(&self, lower: FileConfig, higher: FileConfig) -> FileConfig {
        FileConfig {
            defaults: match (lower.defaults, higher.defaults) {
                (Some(lower_defaults), Some(higher_defaults)) => Some(DefaultsConfig {
                    max_concurrent: higher_defaults
                        .max_concurrent
                        .or(lower_defaults.max_concurrent),
                    timeout: higher_defaults.timeout.or(lower_defaults.timeout),
                    resolver: higher_defaults.resolver.or(lower_defaults.resolver),
                    attempts: higher_defaults.attempts.or(lower_defaults.attempts),
                }),
                (lower_defaults, higher_defaults) => higher_defaults.or(lower_defaults),
            },
            output: match (lower.output, higher.output) {
                (Some(lower_output), Some(higher_output)) => Some(OutputConfig {
                    default_format: higher_output
                        .default_format
                        .or(lower_output.default_format),
                }),
                (lower_output, higher_output) => higher_output.or(lower_output),
            },
        }
    }

    /// Validate a configuration for common issues.
    pub fn validate_config(&self, config: &FileConfig) -> Result<(), ValidationError> {
        if let Some(defaults) = &config.defaults {
            if let Some(max_concurrent) = defaults.max_concurrent {
                if !is_valid_max_concurrent(max_concurrent) {
                    return Err(ValidationError::config(format!(
                        "max_concurrent must be between 1 and {}",
                        MAX_CONCURRENT_LIMIT
                    )));
                }
            }

            if let Some(timeout_str) = &defaults.timeout {
                if !is_valid_timeout(timeout_str) {
                    return Err(ValidationError::config(format!(
                        "Invalid timeout format '{}'. Use format like '5s', '30s', '2m'",
                        timeout_str
                    )));
                }
            }

            if let Some(resolver) = &defaults.resolver {
                resolver
                    .parse::<NameserverChoice>()
                    .map_err(ValidationError::config)?;
            }

            if let Some(attempts) = defaults.attempts {
                if attempts == 0 || attempts > MAX_ATTEMPTS {
                    return Err(ValidationError::config(format!(
                        "attempts must be between 1 and {}",
                        MAX_ATTEMPTS
                    )));
                }
            }
        }

        if let Some(output) = &config.output {
            if let Some(format) = &output.default_format {
                if !OUTPUT_FORMATS.contains(&format.to_lowercase().as_str()) {
                    return Err(ValidationError::config(format!(
                        "Unknown output format '{}'. Use one of: text, json, csv",
                        format
                    )));
                }
            }
        }

        Ok(())
    }
}

fn is_valid_max_concurrent(value: usize) -> bool {
    (1..=MAX_CONCURRENT_LIMIT).contains(&value)
}

fn is_valid_timeout(value: &str) -> bool {
    matches!(parse_timeout_string(value), Some(secs) if secs > 0)
}

/// Environment variable configuration that mirrors CLI options.
///
/// This represents configuration values that can be set via `EV_*`
/// environment variables.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnvConfig {
    pub max_concurrent: Option<usize>,
    pub timeout: Option<String>,
    pub resolver: Option<NameserverChoice>,
    pub attempts: Option<usize>,
    pub json: Option<bool>,
    pub csv: Option<bool>,
    pub file: Option<String>,
    pub config: Option<String>,
}

impl EnvConfig {
    /// Check if output format conflicts exist (JSON and CSV both set).
    pub fn has_output_format_conflict(&self) -> bool {
        matches!((self.json, self.csv), (Some(true), Some(true)))
    }
}

/// Load configuration from `EV_*` environment variables.
///
/// Invalid values are logged as warnings and ignored.
pub fn load_env_config() -> EnvConfig {
    env_config_from(|key| env::var(key).ok())
}

/// Build an `EnvConfig` from any key lookup.
pub fn env_config_from<F>(lookup: F) -> EnvConfig
where
    F: Fn(&str) -> Option<String>,
{
    let mut env_config = EnvConfig::default();

    if let Some(val) = lookup("EV_MAX_CONCURRENT") {
        match val.trim().parse::<usize>() {
            Ok(n) if is_valid_max_concurrent(n) => {
                env_config.max_concurrent = Some(n);
                tracing::info!("Using EV_MAX_CONCURRENT={}", n);
            }
            _ => tracing::warn!(
                "Invalid EV_MAX_CONCURRENT='{}', must be 1-{}",
                val,
                MAX_CONCURRENT_LIMIT
            ),
        }
    }

    if let Some(val) = lookup("EV_TIMEOUT") {
        if is_valid_timeout(&val) {
            tracing::info!("Using EV_TIMEOUT={}", val);
            env_config.timeout = Some(val);
        } else {
            tracing::warn!(
                "Invalid EV_TIMEOUT='{}', use format like '5s', '30s', '2m'",
                val
            );
        }
    }

    if let Some(val) = lookup("EV_RESOLVER") {
        match val.parse::<NameserverChoice>() {
            Ok(choice) => {
                env_config.resolver = Some(choice);
                tracing::info!("Using EV_RESOLVER={}", choice);
            }
            Err(e) => tracing::warn!("Invalid EV_RESOLVER: {}", e),
        }
    }

    if let Some(val) = lookup("EV_ATTEMPTS") {
        match val.trim().parse::<usize>() {
            Ok(n) if (1..=MAX_ATTEMPTS).contains(&n) => {
                env_config.attempts = Some(n);
                tracing::info!("Using EV_ATTEMPTS={}", n);
            }
            _ => tracing::warn!("Invalid EV_ATTEMPTS='{}', must be 1-{}", val, MAX_ATTEMPTS),
        }
    }

    env_config.json = lookup("EV_JSON").and_then(|val| parse_env_bool("EV_JSON", &val));
    env_config.csv = lookup("EV_CSV").and_then(|val| parse_env_bool("EV_CSV", &val));

    if let Some(path) = lookup("EV_FILE").filter(|p| !p.trim().is_empty()) {
        tracing::info!("Using EV_FILE={}", path);
        env_config.file = Some(path);
    }

    if let Some(path) = lookup("EV_CONFIG").filter(|p| !p.trim().is_empty()) {
        tracing::info!("Using EV_CONFIG={}", path);
        env_config.config = Some(path);
    }

    env_config
}

fn parse_env_bool(key: &str, val: &str) -> Option<bool> {
    match val.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => {
            tracing::info!("Using {}=true", key);
            Some(true)
        }
        "false" | "0" | "no" | "off" => {
            tracing::info!("Using {}=false", key);
            Some(false)
        }
        _ => {
            tracing::warn!("Invalid {}='{}', use true/false", key, val);
            None
        }
    }
}

/// Parse a timeout string like "5s", "30s", "2m" into seconds.
///
/// A bare number is taken as seconds. Returns `None` if parsing fails.
pub fn parse_timeout_string(timeout_str: &str) -> Option<u64> {
    let timeout_str = timeout_str.trim().to_lowercase();

    if let Some(secs) = timeout_str.strip_suffix('s') {
        secs.parse::<u64>().ok()
    } else if let Some(mins) = timeout_str.strip_suffix('m') {
        mins.parse::<u64>().ok().and_then(|m| m.checked_mul(60))
    } else {
        timeout_str.parse::<u64>().ok()
    }
}
