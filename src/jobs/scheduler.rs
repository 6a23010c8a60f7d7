use std::sync::Arc;
use std::time::Duration;

use jiff::Timestamp;

use crate::jobs::backend::{JobBackend, RecurringRegistration, Submission};
use crate::jobs::cron::CronExpression;
use crate::jobs::error::JobError;
use crate::jobs::job::{OnDemandJob, RecurringJob};
use crate::jobs::registry::JobRegistry;
use crate::jobs::types::{Attribution, JobData, JobExecutionContext, JobStatus, TrackingId};

/// Facade bridging job descriptors to a queue backend.
///
/// Holds no mutable state of its own: every call resolves a fresh job
/// instance from the registry and forwards to the backend. Cloning is cheap.
#[derive(Clone)]
pub struct JobScheduler {
    backend: Arc<dyn JobBackend>,
    registry: Arc<JobRegistry>,
}

impl JobScheduler {
    pub fn new(backend: Arc<dyn JobBackend>, registry: JobRegistry) -> Self {
        Self {
            backend,
            registry: Arc::new(registry),
        }
    }

    pub fn registry(&self) -> &JobRegistry {
        &self.registry
    }

    /// Register recurring job `T` under its stable job id.
    ///
    /// Disabled jobs are not registered; their id is returned all the same.
    pub async fn schedule_cron_job<T: RecurringJob + 'static>(&self) -> Result<String, JobError> {
        let job = self.registry.resolve_recurring::<T>()?;
        let job_id = job.job_id().to_string();

        if !job.is_enabled() {
            tracing::info!(job_id = %job_id, "Recurring job disabled, not scheduling");
            return Ok(job_id);
        }

        let cron = CronExpression::parse(job.cron_expression())?;
        self.backend
            .add_or_update_recurring(RecurringRegistration {
                job_id: job_id.clone(),
                cron: cron.clone(),
                job,
            })
            .await?;

        tracing::info!(job_id = %job_id, cron = %cron, timezone = "UTC", "Recurring job scheduled");
        Ok(job_id)
    }

    /// Remove the recurring schedule of `T`, if any.
    pub async fn unschedule_cron_job<T: RecurringJob + 'static>(&self) -> Result<bool, JobError> {
        let job = self.registry.resolve_recurring::<T>()?;
        let removed = self.backend.remove_recurring(job.job_id()).await?;
        tracing::info!(job_id = %job.job_id(), removed, "Recurring job unscheduled");
        Ok(removed)
    }

    /// Submit `T` for immediate asynchronous execution.
    pub async fn enqueue_job<T: OnDemandJob + 'static>(
        &self,
        data: Option<JobData>,
    ) -> Result<TrackingId, JobError> {
        self.enqueue_job_with::<T>(data, Attribution::default()).await
    }

    /// Like [`enqueue_job`](Self::enqueue_job), attributing the run to a user or tenant.
    pub async fn enqueue_job_with<T: OnDemandJob + 'static>(
        &self,
        data: Option<JobData>,
        attribution: Attribution,
    ) -> Result<TrackingId, JobError> {
        let submission = self.prepare::<T>(data, attribution)?;
        let execution_id = submission.context.job_id.clone();
        let job_id = submission.job.job_id().to_string();

        let tracking_id = self.backend.enqueue(submission).await?;

        tracing::info!(
            tracking_id = %tracking_id,
            execution_id = %execution_id,
            job_id = %job_id,
            "On-demand job enqueued"
        );
        Ok(tracking_id)
    }

    /// Submit `T` for execution no earlier than `delay_until`.
    pub async fn schedule_job<T: OnDemandJob + 'static>(
        &self,
        delay_until: Timestamp,
        data: Option<JobData>,
    ) -> Result<TrackingId, JobError> {
        self.schedule_job_with::<T>(delay_until, data, Attribution::default())
            .await
    }

    pub async fn schedule_job_with<T: OnDemandJob + 'static>(
        &self,
        delay_until: Timestamp,
        data: Option<JobData>,
        attribution: Attribution,
    ) -> Result<TrackingId, JobError> {
        let submission = self.prepare::<T>(data, attribution)?;

        let delay = delay_until.duration_since(Timestamp::now());
        if delay.is_negative() {
            return Err(JobError::validation(
                "delay_until",
                format!("{} is in the past", delay_until),
            ));
        }
        let delay = Duration::try_from(delay)
            .map_err(|e| JobError::validation("delay_until", e.to_string()))?;

        let execution_id = submission.context.job_id.clone();
        let job_id = submission.job.job_id().to_string();

        let tracking_id = self.backend.schedule(submission, delay).await?;

        tracing::info!(
            tracking_id = %tracking_id,
            execution_id = %execution_id,
            job_id = %job_id,
            run_at = %delay_until,
            "On-demand job scheduled"
        );
        Ok(tracking_id)
    }

    /// Best-effort removal of a job that has not started.
    pub async fn cancel_job(&self, tracking_id: &TrackingId) -> Result<bool, JobError> {
        let removed = self.backend.delete(tracking_id).await?;
        tracing::info!(tracking_id = %tracking_id, removed, "Job cancellation requested");
        Ok(removed)
    }

    /// Current status, or `None` when the backend does not know the id.
    pub async fn get_job_status(
        &self,
        tracking_id: &TrackingId,
    ) -> Result<Option<JobStatus>, JobError> {
        match self.backend.state_name(tracking_id).await? {
            Some(name) => map_native_state(&name).map(Some).ok_or_else(|| {
                JobError::backend(format!("Unrecognised job state '{}' for {}", name, tracking_id))
            }),
            None => Ok(None),
        }
    }

    /// Stop starting new work. Running attempts are not interrupted.
    pub async fn pause_scheduler(&self) -> Result<(), JobError> {
        self.backend.pause().await?;
        tracing::info!("Job scheduler paused");
        Ok(())
    }

    pub async fn resume_scheduler(&self) -> Result<(), JobError> {
        self.backend.resume().await?;
        tracing::info!("Job scheduler resumed");
        Ok(())
    }

    fn prepare<T: OnDemandJob + 'static>(
        &self,
        data: Option<JobData>,
        attribution: Attribution,
    ) -> Result<Submission, JobError> {
        let job = self.registry.resolve_on_demand::<T>()?;
        let context = JobExecutionContext::new(job.job_name(), data.unwrap_or_default())
            .with_attribution(attribution);

        Ok(Submission { context, job })
    }
}

/// Maps a backend-native state name onto the public status set.
fn map_native_state(name: &str) -> Option<JobStatus> {
    match name {
        "Enqueued" => Some(JobStatus::Enqueued),
        "Processing" => Some(JobStatus::Processing),
        "Succeeded" => Some(JobStatus::Succeeded),
        "Failed" => Some(JobStatus::Failed),
        "Deleted" => Some(JobStatus::Deleted),
        "Awaiting" | "Scheduled" => Some(JobStatus::Awaiting),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_native_state() {
        assert_eq!(map_native_state("Enqueued"), Some(JobStatus::Enqueued));
        assert_eq!(map_native_state("Scheduled"), Some(JobStatus::Awaiting));
        assert_eq!(map_native_state("Awaiting"), Some(JobStatus::Awaiting));
        assert_eq!(map_native_state("Processing"), Some(JobStatus::Processing));
        assert_eq!(map_native_state("Succeeded"), Some(JobStatus::Succeeded));
        assert_eq!(map_native_state("Failed"), Some(JobStatus::Failed));
        assert_eq!(map_native_state("Deleted"), Some(JobStatus::Deleted));
        assert_eq!(map_native_state("succeeded"), None);
        assert_eq!(map_native_state("Exploded"), None);
    }
}
