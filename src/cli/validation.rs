//! Value parsers for CLI arguments

use std::fs;
use std::path::PathBuf;

/// Validate that a file path exists, is a file and is readable
pub fn validate_config_file_path(path_str: &str) -> Result<PathBuf, String> {
    let path = PathBuf::from(path_str);

    if !path.exists() {
        return Err(format!("Configuration file does not exist: '{}'", path_str));
    }

    if !path.is_file() {
        return Err(format!("Configuration path is not a file: '{}'", path_str));
    }

    match fs::File::open(&path) {
        Ok(_) => Ok(path),
        Err(e) => Err(format!("Cannot read configuration file '{}': {}", path_str, e)),
    }
}

/// Parse a `key=value` payload entry. The value may be empty or contain `=`.
pub fn parse_key_value(input: &str) -> Result<(String, String), String> {
    let (key, value) = input
        .split_once('=')
        .ok_or_else(|| format!("Expected KEY=VALUE, got: '{}'", input))?;

    let key = key.trim();
    if key.is_empty() {
        return Err(format!("Payload key cannot be empty: '{}'", input));
    }

    Ok((key.to_string(), value.to_string()))
}
