//! Run command handler
//!
//! Submits one on-demand job to an in-process backend and waits until it
//! reaches a terminal status.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, bail};
use jiff::{SignedDuration, Timestamp};
use serde_json::json;

use super::{builtin_registry, shutdown_signal};
use crate::config::Settings;
use crate::jobs::tasks::{TaskExportJob, TaskNotificationJob};
use crate::jobs::{
    Attribution, InMemoryBackend, JobData, JobDescriptorInfo, JobError, JobResult, JobScheduler,
    JobStatus, JobValue, OnDemandJob, TrackingId,
};

const POLL_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Default)]
pub struct RunRequest {
    pub job: String,
    pub data: Vec<(String, String)>,
    pub delay: Option<u64>,
    pub user_id: Option<String>,
}

/// Final state of a submitted run
#[derive(Debug)]
pub struct RunOutcome {
    pub tracking_id: TrackingId,
    pub status: JobStatus,
    /// `None` when no attempt produced a result
    pub result: Option<JobResult>,
}

pub struct RunCommandHandler {
    config: Settings,
}

impl RunCommandHandler {
    pub fn new(config: Settings) -> Self {
        Self { config }
    }

    /// Run `request`, print the outcome as JSON and fail unless it succeeded
    pub async fn execute(&self, request: &RunRequest) -> anyhow::Result<()> {
        let outcome = tokio::select! {
            outcome = self.run(request) => outcome?,
            _ = shutdown_signal() => bail!("Interrupted while waiting for {}", request.job),
        };

        let report = json!({
            "trackingId": outcome.tracking_id,
            "status": outcome.status,
            "result": outcome.result,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);

        if outcome.status != JobStatus::Succeeded {
            bail!("Job {} finished with status {}", request.job, outcome.status);
        }
        Ok(())
    }

    pub async fn run(&self, request: &RunRequest) -> anyhow::Result<RunOutcome> {
        let backend = Arc::new(InMemoryBackend::new().await?);
        let scheduler = JobScheduler::new(backend.clone(), builtin_registry(&self.config.jobs));

        let tracking_id = match request.job.as_str() {
            "task-notification" => submit::<TaskNotificationJob>(&scheduler, request).await?,
            "task-export" => submit::<TaskExportJob>(&scheduler, request).await?,
            other => bail!(
                "Unknown on-demand job '{}'. Available: {}",
                other,
                on_demand_ids(&scheduler)?.join(", ")
            ),
        };

        let status = wait_for_terminal(&scheduler, &tracking_id).await?;
        let result = backend.last_result(&tracking_id);

        Ok(RunOutcome {
            tracking_id,
            status,
            result,
        })
    }
}

async fn submit<T: OnDemandJob + 'static>(
    scheduler: &JobScheduler,
    request: &RunRequest,
) -> Result<TrackingId, JobError> {
    let data: JobData = request
        .data
        .iter()
        .map(|(key, value)| (key.clone(), JobValue::from(value.as_str())))
        .collect();
    let attribution = request
        .user_id
        .clone()
        .map(Attribution::user)
        .unwrap_or_default();

    match request.delay {
        Some(seconds) => {
            let run_at = i64::try_from(seconds)
                .ok()
                .and_then(|s| Timestamp::now().checked_add(SignedDuration::from_secs(s)).ok())
                .ok_or_else(|| JobError::validation("delay", "delay is out of range"))?;
            scheduler
                .schedule_job_with::<T>(run_at, Some(data), attribution)
                .await
        }
        None => {
            scheduler
                .enqueue_job_with::<T>(Some(data), attribution)
                .await
        }
    }
}

async fn wait_for_terminal(
    scheduler: &JobScheduler,
    tracking_id: &TrackingId,
) -> anyhow::Result<JobStatus> {
    loop {
        let status = scheduler
            .get_job_status(tracking_id)
            .await?
            .with_context(|| format!("Job {} is no longer tracked", tracking_id))?;

        if status.is_terminal() {
            return Ok(status);
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }
}

fn on_demand_ids(scheduler: &JobScheduler) -> Result<Vec<String>, JobError> {
    Ok(scheduler
        .registry()
        .descriptors()?
        .into_iter()
        .filter(|d| matches!(d, JobDescriptorInfo::OnDemand { .. }))
        .map(|d| d.job_id().to_string())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handler() -> RunCommandHandler {
        let mut config = Settings::default();
        config.jobs.simulated_latency_ms = 0;
        RunCommandHandler::new(config)
    }

    fn request(job: &str, data: &[(&str, &str)]) -> RunRequest {
        RunRequest {
            job: job.to_string(),
            data: data
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            ..Default::default()
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_run_notification() {
        let request = request(
            "task-notification",
            &[("taskId", "42"), ("recipientEmail", "a@b.com")],
        );

        let outcome = handler().run(&request).await.unwrap();

        assert_eq!(outcome.status, JobStatus::Succeeded);
        assert_eq!(outcome.tracking_id.as_str(), "1");
        assert!(outcome.result.unwrap().message().contains("a@b.com"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_run_validation_failure_is_not_retried() {
        let request = request("task-notification", &[("taskId", "42")]);

        let outcome = handler().run(&request).await.unwrap();

        assert_eq!(outcome.status, JobStatus::Failed);
        let result = outcome.result.unwrap();
        assert_eq!(result.error_message(), Some("recipientEmail is required"));
        assert_eq!(result.retry_count(), 0);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_run_export_attributed_to_user() {
        let mut request = request("task-export", &[("format", "json")]);
        request.user_id = Some("user-2".to_string());

        let outcome = handler().run(&request).await.unwrap();

        assert_eq!(outcome.status, JobStatus::Succeeded);
        let result = outcome.result.unwrap();
        assert_eq!(result.message(), "Exported 2 tasks for user user-2 as json");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_run_unknown_job() {
        let err = handler()
            .run(&request("data-cleanup", &[]))
            .await
            .unwrap_err();

        let message = err.to_string();
        assert!(message.contains("Unknown on-demand job 'data-cleanup'"));
        assert!(message.contains("task-export, task-notification"));
    }
}
