//! Tests for the logger module

use std::io::Write;
use std::path::PathBuf;

use proptest::prelude::*;
use tempfile::tempdir;

use crate::logger::config::*;
use crate::logger::{LoggerError, open_log_file};

fn console_only() -> LoggerConfig {
    LoggerConfig {
        console: ConsoleConfig::new(true, false),
        file: FileConfig {
            enabled: false,
            ..Default::default()
        },
        level: "info".to_string(),
    }
}

#[test]
fn test_default_config_is_valid() {
    let config = LoggerConfig::default();
    assert!(config.validate().is_ok());
    assert!(config.console.enabled);
    assert!(!config.file.enabled);
    assert_eq!(config.file.format, LogFormat::Json);
}

#[test]
fn test_both_outputs_disabled() {
    let mut config = console_only();
    config.console.enabled = false;
    assert!(config.validate().is_err());
}

#[test]
fn test_log_format_parsing() {
    assert_eq!("full".parse::<LogFormat>().unwrap(), LogFormat::Full);
    assert_eq!("Compact".parse::<LogFormat>().unwrap(), LogFormat::Compact);
    assert_eq!("JSON".parse::<LogFormat>().unwrap(), LogFormat::Json);
    assert!("pretty".parse::<LogFormat>().is_err());
    assert_eq!(LogFormat::Compact.as_str(), "compact");
}

#[test]
fn test_file_config_rejects_empty_path() {
    assert!(FileConfig::new(true, PathBuf::new(), true, LogFormat::Full).is_err());
    // Disabled output does not need a path
    assert!(FileConfig::new(false, PathBuf::new(), true, LogFormat::Full).is_ok());
}

#[test]
fn test_open_log_file_creates_parent_dirs() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("nested/deeper/jobs.log");
    let config = FileConfig::new(true, path.clone(), true, LogFormat::Json).unwrap();

    let mut file = open_log_file(&config).unwrap();
    writeln!(file, "first").unwrap();

    assert!(path.exists());
}

#[test]
fn test_open_log_file_append_and_truncate() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("jobs.log");
    std::fs::write(&path, "old line\n").unwrap();

    let append = FileConfig::new(true, path.clone(), true, LogFormat::Full).unwrap();
    writeln!(open_log_file(&append).unwrap(), "new line").unwrap();
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "old line\nnew line\n");

    let truncate = FileConfig::new(true, path.clone(), false, LogFormat::Full).unwrap();
    writeln!(open_log_file(&truncate).unwrap(), "fresh").unwrap();
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "fresh\n");
}

#[test]
fn test_open_log_file_error_names_path() {
    let dir = tempdir().unwrap();
    // A directory cannot be opened as a log file
    let config = FileConfig::new(true, dir.path().to_path_buf(), true, LogFormat::Full).unwrap();

    match open_log_file(&config) {
        Err(LoggerError::OpenFile { path, .. }) => assert_eq!(path, dir.path()),
        other => panic!("Expected OpenFile error, got {:?}", other),
    }
}

proptest! {
    /// Any configuration with at least one output and a known level is valid
    #[test]
    fn property_valid_configs_validate(
        console_enabled in any::<bool>(),
        file_enabled in any::<bool>(),
        colored in any::<bool>(),
        append in any::<bool>(),
        level_idx in 0usize..5usize,
    ) {
        prop_assume!(console_enabled || file_enabled);
        let levels = ["trace", "debug", "info", "warn", "error"];

        let config = LoggerConfig {
            console: ConsoleConfig::new(console_enabled, colored),
            file: FileConfig {
                enabled: file_enabled,
                path: PathBuf::from("test.log"),
                append,
                format: LogFormat::Compact,
            },
            level: levels[level_idx].to_string(),
        };

        prop_assert!(config.validate().is_ok());
    }

    #[test]
    fn property_invalid_levels_fail(invalid_level in "[a-z]{1,10}[A-Z0-9]{1,5}") {
        prop_assume!(!["trace", "debug", "info", "warn", "error"]
            .contains(&invalid_level.to_lowercase().as_str()));

        let mut config = LoggerConfig::default();
        config.level = invalid_level;

        prop_assert!(config.validate().is_err());
    }
}
