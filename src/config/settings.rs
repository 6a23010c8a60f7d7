//! Configuration settings structures for taskflow-jobs
//!
//! This module defines all configuration structures that can be loaded from
//! TOML files and environment variables.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::error::ConfigError;
use crate::logger::{ConsoleConfig, FileConfig, LogFormat, LoggerConfig};

// ============================================================================
// Default value functions
// ============================================================================

fn default_app_name() -> String {
    "taskflow-jobs".to_string()
}

fn default_app_version() -> String {
    crate::pkg_version().to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

fn default_log_path() -> String {
    "logs/jobs.log".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

fn default_simulated_latency_ms() -> u64 {
    500
}

fn default_cleanup_cron() -> String {
    "0 2 * * *".to_string()
}

fn default_retention_days() -> u32 {
    30
}

fn default_reminder_cron() -> String {
    "0 9 * * *".to_string()
}

fn default_lookahead_hours() -> u32 {
    24
}

fn default_report_cron() -> String {
    "0 8 * * 1".to_string()
}

fn default_notification_job() -> OnDemandJobConfig {
    OnDemandJobConfig {
        max_retry_attempts: 3,
        timeout_seconds: 60,
    }
}

fn default_export_job() -> OnDemandJobConfig {
    OnDemandJobConfig {
        max_retry_attempts: 4,
        timeout_seconds: 300,
    }
}

// ============================================================================
// Application Configuration
// ============================================================================

/// Application basic information configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationConfig {
    /// Application name
    #[serde(default = "default_app_name")]
    pub name: String,

    /// Application version
    #[serde(default = "default_app_version")]
    pub version: String,
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            name: default_app_name(),
            version: default_app_version(),
        }
    }
}

// ============================================================================
// Logger Settings
// ============================================================================

/// Console output settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsoleSettings {
    /// Whether console output is enabled
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Whether to use colored output
    #[serde(default = "default_true")]
    pub colored: bool,
}

impl Default for ConsoleSettings {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            colored: default_true(),
        }
    }
}

/// File output settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSettings {
    /// Whether file output is enabled
    #[serde(default)]
    pub enabled: bool,

    /// Path to the log file
    #[serde(default = "default_log_path")]
    pub path: String,

    /// Whether to append to existing file
    #[serde(default = "default_true")]
    pub append: bool,

    /// Log format: "full", "compact", or "json"
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for FileSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            path: default_log_path(),
            append: default_true(),
            format: default_log_format(),
        }
    }
}

/// Logger configuration settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggerSettings {
    /// Log level: "trace", "debug", "info", "warn", "error"
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Console output settings
    #[serde(default)]
    pub console: ConsoleSettings,

    /// File output settings
    #[serde(default)]
    pub file: FileSettings,
}

impl Default for LoggerSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            console: ConsoleSettings::default(),
            file: FileSettings::default(),
        }
    }
}

impl LoggerSettings {
    /// Convert LoggerSettings to the runtime LoggerConfig
    pub fn into_logger_config(self) -> Result<LoggerConfig, ConfigError> {
        let console_config = ConsoleConfig::new(self.console.enabled, self.console.colored);
        let file_config = self.file.into_file_config()?;

        LoggerConfig::new(console_config, file_config, self.level).map_err(|e| {
            ConfigError::ValidationError {
                field: "logger".to_string(),
                message: e.to_string(),
            }
        })
    }
}

impl FileSettings {
    /// Convert FileSettings to FileConfig
    pub fn into_file_config(self) -> Result<FileConfig, ConfigError> {
        let format = self
            .format
            .parse::<LogFormat>()
            .map_err(|e| ConfigError::ValidationError {
                field: "logger.file.format".to_string(),
                message: e.to_string(),
            })?;

        FileConfig::new(self.enabled, PathBuf::from(self.path), self.append, format).map_err(
            |e| ConfigError::ValidationError {
                field: "logger.file".to_string(),
                message: e.to_string(),
            },
        )
    }
}

// ============================================================================
// Jobs Configuration
// ============================================================================

/// Cleanup of old completed tasks
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanupJobConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// 5-field cron expression, UTC
    #[serde(default = "default_cleanup_cron")]
    pub cron: String,

    /// Completed tasks older than this are purged
    #[serde(default = "default_retention_days")]
    pub retention_days: u32,
}

impl Default for CleanupJobConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            cron: default_cleanup_cron(),
            retention_days: default_retention_days(),
        }
    }
}

/// Reminders for tasks coming due
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderJobConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_reminder_cron")]
    pub cron: String,

    /// How far ahead a due date triggers a reminder
    #[serde(default = "default_lookahead_hours")]
    pub lookahead_hours: u32,
}

impl Default for ReminderJobConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            cron: default_reminder_cron(),
            lookahead_hours: default_lookahead_hours(),
        }
    }
}

/// Weekly activity report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportJobConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "default_report_cron")]
    pub cron: String,
}

impl Default for ReportJobConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            cron: default_report_cron(),
        }
    }
}

/// Retry and timeout policy of an on-demand job
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OnDemandJobConfig {
    /// Retries after the first failed attempt
    pub max_retry_attempts: u32,

    /// Execution timeout in seconds
    pub timeout_seconds: u64,
}

impl OnDemandJobConfig {
    pub fn execution_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

/// Job scheduling configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobsConfig {
    /// Whether the worker registers recurring jobs on startup
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Artificial latency of the sample job bodies, in milliseconds
    #[serde(default = "default_simulated_latency_ms")]
    pub simulated_latency_ms: u64,

    #[serde(default)]
    pub cleanup: CleanupJobConfig,

    #[serde(default)]
    pub reminders: ReminderJobConfig,

    #[serde(default)]
    pub reports: ReportJobConfig,

    #[serde(default = "default_notification_job")]
    pub notifications: OnDemandJobConfig,

    #[serde(default = "default_export_job")]
    pub exports: OnDemandJobConfig,
}

impl JobsConfig {
    pub fn simulated_latency(&self) -> Duration {
        Duration::from_millis(self.simulated_latency_ms)
    }
}

impl Default for JobsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            simulated_latency_ms: default_simulated_latency_ms(),
            cleanup: CleanupJobConfig::default(),
            reminders: ReminderJobConfig::default(),
            reports: ReportJobConfig::default(),
            notifications: default_notification_job(),
            exports: default_export_job(),
        }
    }
}

// ============================================================================
// Main Settings Structure
// ============================================================================

/// Complete application settings
///
/// This structure represents the entire configuration that can be loaded
/// from TOML files and environment variables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Settings {
    /// Application information
    #[serde(default)]
    pub application: ApplicationConfig,

    /// Logger configuration
    #[serde(default)]
    pub logger: LoggerSettings,

    /// Job scheduling configuration
    #[serde(default)]
    pub jobs: JobsConfig,
}
