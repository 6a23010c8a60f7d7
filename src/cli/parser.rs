//! CLI argument parsing with clap

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// Background job worker for the taskflow service
#[derive(Parser, Debug)]
#[command(name = "taskflow-jobs")]
#[command(about = "Background job worker for the taskflow service")]
#[command(long_about = "
taskflow-jobs runs the recurring maintenance jobs of the taskflow service
and lets operators trigger on-demand jobs by hand.

EXAMPLES:
    # Run the worker with the layered configuration in ./config
    taskflow-jobs worker

    # Check configuration and the recurring schedule without starting
    taskflow-jobs worker --dry-run

    # List every registered job
    taskflow-jobs jobs

    # Send a notification and wait for the result
    taskflow-jobs run task-notification --data taskId=42 --data recipientEmail=a@b.com

    # Export a user's tasks as JSON in 30 seconds
    taskflow-jobs run task-export --user-id user-1 --data format=json --delay 30
")]
#[command(version = crate::clap_long_version())]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Configuration file path
    ///
    /// Load this single TOML file instead of the layered configuration
    /// directory. The file must exist and be readable.
    #[arg(short, long, value_name = "FILE", value_parser = super::validation::validate_config_file_path)]
    pub config: Option<PathBuf>,

    /// Override environment detection
    ///
    /// Selects the `{environment}.toml` layer. Takes precedence over
    /// TASKFLOW_APP_ENV.
    #[arg(short, long, value_enum)]
    pub env: Option<Environment>,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Only log errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the job worker (default)
    ///
    /// Registers the enabled recurring jobs, then runs until Ctrl+C or SIGTERM.
    Worker {
        /// Log level override, takes precedence over --verbose/--quiet
        #[arg(long, value_enum)]
        log_level: Option<LogLevel>,

        /// Validate configuration, print the schedule and exit
        #[arg(long)]
        dry_run: bool,
    },

    /// List registered jobs
    Jobs {
        /// Print one JSON object per job
        #[arg(long)]
        json: bool,
    },

    /// Run an on-demand job and wait for its result
    ///
    /// The result is printed as JSON. Exits non-zero when the job does not
    /// succeed.
    Run {
        /// Job id, for example task-notification or task-export
        job: String,

        /// Payload entry, may be repeated
        #[arg(short, long = "data", value_name = "KEY=VALUE", value_parser = super::validation::parse_key_value)]
        data: Vec<(String, String)>,

        /// Delay before the job becomes eligible to run
        #[arg(long, value_name = "SECONDS")]
        delay: Option<u64>,

        /// User the run is attributed to
        #[arg(long, value_name = "ID")]
        user_id: Option<String>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum Environment {
    #[value(name = "development", alias = "dev")]
    Development,
    #[value(name = "test")]
    Test,
    #[value(name = "staging", alias = "stage")]
    Staging,
    #[value(name = "production", alias = "prod")]
    Production,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum LogLevel {
    #[value(name = "error")]
    Error,
    #[value(name = "warn", alias = "warning")]
    Warn,
    #[value(name = "info")]
    Info,
    #[value(name = "debug")]
    Debug,
    #[value(name = "trace")]
    Trace,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

impl From<Environment> for crate::config::Environment {
    fn from(env: Environment) -> Self {
        match env {
            Environment::Development => crate::config::Environment::Development,
            Environment::Test => crate::config::Environment::Test,
            Environment::Staging => crate::config::Environment::Staging,
            Environment::Production => crate::config::Environment::Production,
        }
    }
}
