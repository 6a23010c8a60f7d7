//! Merges CLI overrides into file-based configuration.

use std::path::Path;

use super::parser::{Cli, Commands};
use crate::config::error::ConfigError;
use crate::config::{ConfigLoader, Settings};

/// Applies CLI overrides on top of loaded settings.
///
/// Precedence: command flags over global flags over configuration sources.
pub struct ConfigurationMerger {
    base_config: Settings,
}

impl ConfigurationMerger {
    pub fn new(base_config: Settings) -> Self {
        Self { base_config }
    }

    /// Load settings the way `cli` asks for: a single `--config` file or the
    /// layered directory, with `--env` overriding `TASKFLOW_APP_ENV`.
    pub fn from_cli(cli: &Cli) -> Result<Self, ConfigError> {
        let loader = match cli.config.as_deref() {
            Some(path) => Self::file_loader(path)?,
            None => ConfigLoader::new()?,
        };
        let loader = match cli.env {
            Some(env) => loader.with_environment(env.into()),
            None => loader,
        };

        Ok(Self::new(loader.load()?))
    }

    fn file_loader(path: &Path) -> Result<ConfigLoader, ConfigError> {
        if !path.is_file() {
            return Err(ConfigError::validation(
                "config_file",
                format!("Configuration path is not a readable file: '{}'", path.display()),
            ));
        }
        Ok(ConfigLoader::from_file(path))
    }

    /// Returns a validated copy of the base settings with CLI overrides applied
    pub fn merge_cli_args(&self, cli: &Cli) -> Result<Settings, ConfigError> {
        let mut config = self.base_config.clone();

        if cli.verbose {
            config.logger.level = "debug".to_string();
        } else if cli.quiet {
            config.logger.level = "error".to_string();
        }

        if let Some(Commands::Worker {
            log_level: Some(level),
            ..
        }) = cli.command
        {
            config.logger.level = level.as_str().to_string();
        }

        config.validate()?;

        Ok(config)
    }

    pub fn config(&self) -> &Settings {
        &self.base_config
    }
}
