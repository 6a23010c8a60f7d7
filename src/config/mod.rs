//! Layered configuration for the job worker
//!
//! Sources, lowest priority first:
//! 1. `default.toml`
//! 2. `{environment}.toml`, selected by `TASKFLOW_APP_ENV`
//! 3. `local.toml`
//! 4. `TASKFLOW_*` environment variables, nested keys split on `__`

pub mod environment;
pub mod error;
pub mod loader;
pub mod settings;
pub mod validation;

pub use environment::Environment;
pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use settings::{
    ApplicationConfig, CleanupJobConfig, JobsConfig, LoggerSettings, OnDemandJobConfig,
    ReminderJobConfig, ReportJobConfig, Settings,
};
