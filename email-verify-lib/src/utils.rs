//! Input helpers for address lists.
//!
//! Address files hold one address per line. Blank lines and lines starting
//! with `#` are skipped, and anything after an inline `#` is dropped.

use crate::error::ValidationError;
use std::fs;
use std::path::Path;

/// Parse newline-separated address text.
///
/// Surrounding whitespace on each line is trimmed; the address itself is
/// otherwise passed through untouched so the syntax filter sees it as
/// written. Duplicates are kept.
pub fn parse_address_lines(content: &str) -> Vec<String> {
    content
        .lines()
        .filter_map(|line| {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                return None;
            }

            // Handle inline comments
            let address = trimmed.split('#').next().unwrap_or("").trim();
            if address.is_empty() {
                None
            } else {
                Some(address.to_string())
            }
        })
        .collect()
}

/// Read an address list from a file.
///
/// # Errors
///
/// Returns `ValidationError::FileError` if the file is missing or cannot be
/// read, or if it contains no addresses at all.
pub fn read_addresses_from_file<P: AsRef<Path>>(path: P) -> Result<Vec<String>, ValidationError> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(ValidationError::file_error(
            path.to_string_lossy(),
            "File not found",
        ));
    }

    let content = fs::read_to_string(path).map_err(|e| {
        ValidationError::file_error(path.to_string_lossy(), format!("Failed to read file: {}", e))
    })?;

    let addresses = parse_address_lines(&content);
    if addresses.is_empty() {
        return Err(ValidationError::file_error(
            path.to_string_lossy(),
            "No addresses found in file",
        ));
    }

    tracing::debug!(path = %path.display(), count = addresses.len(), "loaded address file");
    Ok(addresses)
}
