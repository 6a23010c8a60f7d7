//! Durable queue abstraction behind the scheduler.
//!
//! A backend owns persistence, timing, worker execution and retries. The
//! scheduler only hands it registrations and submissions, and reads back
//! native state names.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::jobs::cron::CronExpression;
use crate::jobs::error::JobError;
use crate::jobs::job::{OnDemandJob, RecurringJob};
use crate::jobs::types::{JobExecutionContext, TrackingId};

/// Recurring schedule keyed by the descriptor's stable job id.
#[derive(Debug, Clone)]
pub struct RecurringRegistration {
    pub job_id: String,
    pub cron: CronExpression,
    pub job: Arc<dyn RecurringJob>,
}

/// One on-demand execution handed to the queue.
#[derive(Debug, Clone)]
pub struct Submission {
    pub context: JobExecutionContext,
    pub job: Arc<dyn OnDemandJob>,
}

#[async_trait]
pub trait JobBackend: Send + Sync {
    /// Upsert a recurring schedule; a second registration under the same
    /// job id replaces the first.
    async fn add_or_update_recurring(&self, registration: RecurringRegistration)
    -> Result<(), JobError>;

    async fn remove_recurring(&self, job_id: &str) -> Result<bool, JobError>;

    /// Queue for immediate asynchronous execution.
    async fn enqueue(&self, submission: Submission) -> Result<TrackingId, JobError>;

    /// Queue for execution no earlier than `delay` from now.
    async fn schedule(&self, submission: Submission, delay: Duration)
    -> Result<TrackingId, JobError>;

    /// Remove a job that has not started yet. Returns whether it was removed.
    async fn delete(&self, tracking_id: &TrackingId) -> Result<bool, JobError>;

    /// Native state name, or `None` when the id is unknown.
    async fn state_name(&self, tracking_id: &TrackingId) -> Result<Option<String>, JobError>;

    async fn pause(&self) -> Result<(), JobError>;

    async fn resume(&self) -> Result<(), JobError>;
}
