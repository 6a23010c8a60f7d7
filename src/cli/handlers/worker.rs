//! Worker command handler
//!
//! Registers the recurring jobs on an in-process backend and keeps it
//! running until shutdown.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use super::{builtin_registry, shutdown_signal};
use crate::config::Settings;
use crate::jobs::tasks::schedule_recurring_jobs;
use crate::jobs::{InMemoryBackend, JobDescriptorInfo, JobScheduler};

pub struct WorkerCommandHandler {
    config: Settings,
}

impl WorkerCommandHandler {
    pub fn new(config: Settings) -> Self {
        Self { config }
    }

    /// Run the worker until Ctrl+C or SIGTERM, or only validate when `dry_run`
    pub async fn execute(&self, dry_run: bool) -> anyhow::Result<()> {
        if dry_run {
            return self.validate_only();
        }

        let shutdown = CancellationToken::new();
        let trigger = shutdown.clone();
        tokio::spawn(async move {
            shutdown_signal().await;
            trigger.cancel();
        });

        self.run_until(shutdown).await
    }

    /// Run the worker until `shutdown` is cancelled
    pub async fn run_until(&self, shutdown: CancellationToken) -> anyhow::Result<()> {
        let backend = Arc::new(InMemoryBackend::new().await?);
        let scheduler = JobScheduler::new(backend.clone(), builtin_registry(&self.config.jobs));

        if self.config.jobs.enabled {
            schedule_recurring_jobs(&scheduler).await?;
        } else {
            tracing::warn!("Recurring jobs are disabled by configuration");
        }

        backend.start().await?;
        tracing::info!(
            name = %self.config.application.name,
            version = %self.config.application.version,
            recurring = ?backend.recurring_job_ids(),
            "Job worker started"
        );

        shutdown.cancelled().await;

        tracing::info!("Stopping job worker");
        backend.shutdown().await?;
        tracing::info!("Job worker stopped");

        Ok(())
    }

    /// Validate configuration and print what the worker would schedule
    pub fn validate_only(&self) -> anyhow::Result<()> {
        self.config.validate()?;
        println!("✓ Configuration is valid");
        println!("✓ Logger configuration is valid");

        let registry = builtin_registry(&self.config.jobs);
        for descriptor in registry.descriptors()? {
            if let JobDescriptorInfo::Recurring {
                job_id,
                cron_expression,
                enabled,
                ..
            } = descriptor
            {
                let active = enabled && self.config.jobs.enabled;
                println!(
                    "{} {} ({} UTC){}",
                    if active { "✓" } else { "-" },
                    job_id,
                    cron_expression,
                    if active { "" } else { " disabled" }
                );
            }
        }

        println!("Dry run completed successfully - worker is ready to start");
        Ok(())
    }

    pub fn config(&self) -> &Settings {
        &self.config
    }
}
