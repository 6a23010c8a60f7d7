//! Configuration validation logic
//!
//! This module provides validation methods for all configuration structures
//! to ensure configuration values are within acceptable ranges and formats.

use crate::config::error::ConfigError;
use crate::config::settings::{FileSettings, JobsConfig, LoggerSettings, OnDemandJobConfig, Settings};
use crate::jobs::CronExpression;

/// Valid log levels
const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Valid log formats
const VALID_LOG_FORMATS: &[&str] = &["full", "compact", "json"];

impl FileSettings {
    /// Validate file settings
    fn validate(&self) -> Result<(), ConfigError> {
        // If file logging is enabled, path must not be empty
        if self.enabled && self.path.trim().is_empty() {
            return Err(ConfigError::validation(
                "logger.file.path",
                "File path is required when file logging is enabled.",
            ));
        }

        if !VALID_LOG_FORMATS.contains(&self.format.to_lowercase().as_str()) {
            return Err(ConfigError::ValidationError {
                field: "logger.file.format".to_string(),
                message: format!(
                    "Invalid log format '{}'. Valid formats are: {}",
                    self.format,
                    VALID_LOG_FORMATS.join(", ")
                ),
            });
        }

        Ok(())
    }
}

impl LoggerSettings {
    /// Validate logger settings
    ///
    /// # Validation Rules
    /// - Log level must be one of: trace, debug, info, warn, error
    /// - If file logging is enabled, path must not be empty
    /// - Log format must be one of: full, compact, json
    /// - At least one output must be enabled
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !VALID_LOG_LEVELS.contains(&self.level.to_lowercase().as_str()) {
            return Err(ConfigError::ValidationError {
                field: "logger.level".to_string(),
                message: format!(
                    "Invalid log level '{}'. Valid levels are: {}",
                    self.level,
                    VALID_LOG_LEVELS.join(", ")
                ),
            });
        }

        if !self.console.enabled && !self.file.enabled {
            return Err(ConfigError::validation(
                "logger",
                "At least one output (console or file) must be enabled.",
            ));
        }

        self.file.validate()?;

        Ok(())
    }
}

impl OnDemandJobConfig {
    fn validate(&self, field: &str) -> Result<(), ConfigError> {
        if self.timeout_seconds == 0 {
            return Err(ConfigError::ValidationError {
                field: format!("{}.timeout_seconds", field),
                message: "Execution timeout must be greater than 0 seconds.".to_string(),
            });
        }

        Ok(())
    }
}

impl JobsConfig {
    /// Validate job settings
    ///
    /// # Validation Rules
    /// - Cron expressions must be standard 5-field expressions
    /// - Retention days and lookahead hours must be greater than 0
    /// - On-demand timeouts must be greater than 0
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_cron("jobs.cleanup.cron", &self.cleanup.cron)?;
        validate_cron("jobs.reminders.cron", &self.reminders.cron)?;
        validate_cron("jobs.reports.cron", &self.reports.cron)?;

        if self.cleanup.retention_days == 0 {
            return Err(ConfigError::validation(
                "jobs.cleanup.retention_days",
                "Retention must be at least 1 day.",
            ));
        }

        if self.reminders.lookahead_hours == 0 {
            return Err(ConfigError::validation(
                "jobs.reminders.lookahead_hours",
                "Reminder lookahead must be at least 1 hour.",
            ));
        }

        self.notifications.validate("jobs.notifications")?;
        self.exports.validate("jobs.exports")?;

        Ok(())
    }
}

fn validate_cron(field: &str, expression: &str) -> Result<(), ConfigError> {
    CronExpression::parse(expression)
        .map(|_| ())
        .map_err(|e| ConfigError::ValidationError {
            field: field.to_string(),
            message: e.to_string(),
        })
}

impl Settings {
    /// Validate all configuration settings
    ///
    /// This method validates all sub-configurations and returns the first
    /// validation error encountered.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.logger.validate()?;
        self.jobs.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field_of(err: ConfigError) -> String {
        match err {
            ConfigError::ValidationError { field, .. } => field,
            other => panic!("Expected ValidationError, got {:?}", other),
        }
    }

    #[test]
    fn test_default_settings_are_valid() {
        assert!(Settings::default().validate().is_ok());
    }

    #[test]
    fn test_logger_invalid_level() {
        let settings = LoggerSettings {
            level: "verbose".to_string(),
            ..Default::default()
        };
        assert_eq!(field_of(settings.validate().unwrap_err()), "logger.level");
    }

    #[test]
    fn test_logger_file_enabled_without_path() {
        let mut settings = LoggerSettings::default();
        settings.file.enabled = true;
        settings.file.path = "  ".to_string();
        assert_eq!(field_of(settings.validate().unwrap_err()), "logger.file.path");
    }

    #[test]
    fn test_logger_requires_an_output() {
        let mut settings = LoggerSettings::default();
        settings.console.enabled = false;
        assert_eq!(field_of(settings.validate().unwrap_err()), "logger");
    }

    #[test]
    fn test_jobs_invalid_cron() {
        let mut config = JobsConfig::default();
        config.reminders.cron = "0 0 9 * * *".to_string();
        assert_eq!(field_of(config.validate().unwrap_err()), "jobs.reminders.cron");
    }

    #[test]
    fn test_jobs_cron_out_of_range() {
        let mut config = JobsConfig::default();
        config.cleanup.cron = "99 99 * * *".to_string();
        assert_eq!(field_of(config.validate().unwrap_err()), "jobs.cleanup.cron");
    }

    #[test]
    fn test_jobs_zero_retention() {
        let mut config = JobsConfig::default();
        config.cleanup.retention_days = 0;
        assert_eq!(
            field_of(config.validate().unwrap_err()),
            "jobs.cleanup.retention_days"
        );
    }

    #[test]
    fn test_jobs_zero_lookahead() {
        let mut config = JobsConfig::default();
        config.reminders.lookahead_hours = 0;
        assert_eq!(
            field_of(config.validate().unwrap_err()),
            "jobs.reminders.lookahead_hours"
        );
    }

    #[test]
    fn test_jobs_zero_timeout() {
        let mut config = JobsConfig::default();
        config.exports.timeout_seconds = 0;
        assert_eq!(
            field_of(config.validate().unwrap_err()),
            "jobs.exports.timeout_seconds"
        );
    }
}
