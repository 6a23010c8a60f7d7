//! Dispatches parsed CLI commands to their handlers.

use super::handlers::{JobsCommandHandler, RunCommandHandler, RunRequest, WorkerCommandHandler};
use super::parser::{Cli, Commands};
use crate::config::Settings;

/// Execute the command in `cli` with merged settings. No command runs the worker.
pub async fn execute_command(cli: &Cli, settings: Settings) -> anyhow::Result<()> {
    match &cli.command {
        None => WorkerCommandHandler::new(settings).execute(false).await,
        Some(Commands::Worker { dry_run, .. }) => {
            WorkerCommandHandler::new(settings).execute(*dry_run).await
        }
        Some(Commands::Jobs { json }) => JobsCommandHandler::new(settings).execute(*json),
        Some(Commands::Run {
            job,
            data,
            delay,
            user_id,
        }) => {
            let request = RunRequest {
                job: job.clone(),
                data: data.clone(),
                delay: *delay,
                user_id: user_id.clone(),
            };
            RunCommandHandler::new(settings).execute(&request).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[tokio::test]
    async fn test_execute_worker_dry_run() {
        let cli = Cli::try_parse_from(["taskflow-jobs", "worker", "--dry-run"]).unwrap();
        assert!(execute_command(&cli, Settings::default()).await.is_ok());
    }

    #[tokio::test]
    async fn test_execute_jobs() {
        let cli = Cli::try_parse_from(["taskflow-jobs", "jobs"]).unwrap();
        assert!(execute_command(&cli, Settings::default()).await.is_ok());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_execute_failed_run_is_an_error() {
        let cli = Cli::try_parse_from(["taskflow-jobs", "run", "task-export"]).unwrap();
        let mut settings = Settings::default();
        settings.jobs.simulated_latency_ms = 0;

        let err = execute_command(&cli, settings).await.unwrap_err();
        assert!(err.to_string().contains("finished with status Failed"));
    }
}
