//! In-process queue backend.
//!
//! On-demand submissions run on tokio tasks; recurring schedules are driven
//! by `tokio-cron-scheduler` in UTC. State lives only in memory, so nothing
//! survives a restart.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use jiff::Timestamp;
use tokio::sync::Mutex;
use tokio::task::AbortHandle;
use tokio::time::Instant;
use tokio_cron_scheduler::{Job as CronJob, JobScheduler as CronScheduler};
use uuid::Uuid;

use crate::jobs::backend::{JobBackend, RecurringRegistration, Submission};
use crate::jobs::error::JobError;
use crate::jobs::executor::{ExecutionObserver, JobExecutor, PauseGate, QueueState};
use crate::jobs::types::{JobResult, TrackingId};

/// How long finished entries stay queryable by default
pub const DEFAULT_RETENTION: Duration = Duration::from_secs(60 * 60);

struct QueueEntry {
    state: QueueState,
    handle: Option<AbortHandle>,
    last_result: Option<JobResult>,
    finished_at: Option<Instant>,
}

impl QueueEntry {
    fn set_state(&mut self, state: QueueState) {
        self.state = state;
        if state.is_terminal() {
            self.finished_at = Some(Instant::now());
        }
    }

    fn is_expired(&self, now: Instant, retention: Duration) -> bool {
        self.finished_at
            .is_some_and(|finished| now.saturating_duration_since(finished) >= retention)
    }
}

type QueueStore = Arc<DashMap<TrackingId, QueueEntry>>;

/// Writes executor progress for one tracking id back into the store.
struct TrackedExecution {
    jobs: QueueStore,
    tracking_id: TrackingId,
}

impl ExecutionObserver for TrackedExecution {
    fn transition(&self, state: QueueState) -> bool {
        match self.jobs.get_mut(&self.tracking_id) {
            Some(mut entry) if entry.state != QueueState::Deleted => {
                entry.set_state(state);
                true
            }
            _ => false,
        }
    }

    fn record(&self, result: &JobResult) {
        if let Some(mut entry) = self.jobs.get_mut(&self.tracking_id) {
            entry.last_result = Some(result.clone());
        }
    }
}

/// Queue backend living entirely inside the current process
pub struct InMemoryBackend {
    cron: Arc<Mutex<CronScheduler>>,
    recurring: DashMap<String, Uuid>,
    jobs: QueueStore,
    executor: JobExecutor,
    pause: PauseGate,
    next_id: AtomicU64,
    retention: Duration,
}

impl InMemoryBackend {
    pub async fn new() -> Result<Self, JobError> {
        let cron = CronScheduler::new()
            .await
            .map_err(|e| JobError::backend_with("Failed to create cron scheduler", e))?;
        let pause = PauseGate::new();

        Ok(Self {
            cron: Arc::new(Mutex::new(cron)),
            recurring: DashMap::new(),
            jobs: Arc::new(DashMap::new()),
            executor: JobExecutor::new(pause.clone()),
            pause,
            next_id: AtomicU64::new(0),
            retention: DEFAULT_RETENTION,
        })
    }

    /// Keep finished entries for `retention` instead of [`DEFAULT_RETENTION`]
    pub fn with_retention(mut self, retention: Duration) -> Self {
        self.retention = retention;
        self
    }

    /// Start firing recurring schedules
    pub async fn start(&self) -> Result<(), JobError> {
        self.cron
            .lock()
            .await
            .start()
            .await
            .map_err(|e| JobError::backend_with("Failed to start cron scheduler", e))
    }

    /// Stop firing recurring schedules
    pub async fn shutdown(&self) -> Result<(), JobError> {
        self.cron
            .lock()
            .await
            .shutdown()
            .await
            .map_err(|e| JobError::backend_with("Failed to stop cron scheduler", e))
    }

    /// Result of the most recent attempt for a tracking id
    pub fn last_result(&self, tracking_id: &TrackingId) -> Option<JobResult> {
        self.jobs
            .get(tracking_id)
            .and_then(|entry| entry.last_result.clone())
    }

    /// Job ids with an active recurring schedule, sorted
    pub fn recurring_job_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.recurring.iter().map(|e| e.key().clone()).collect();
        ids.sort();
        ids
    }

    fn next_tracking_id(&self) -> TrackingId {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        TrackingId::new(id.to_string())
    }

    /// Drops succeeded, failed and deleted entries older than the retention
    fn evict_expired(&self) {
        let now = Instant::now();
        self.jobs
            .retain(|_, entry| !entry.is_expired(now, self.retention));
    }

    fn submit(&self, submission: Submission, delay: Option<Duration>) -> TrackingId {
        self.evict_expired();

        let tracking_id = self.next_tracking_id();
        let initial = if delay.is_some() {
            QueueState::Scheduled
        } else {
            QueueState::Enqueued
        };
        self.jobs.insert(
            tracking_id.clone(),
            QueueEntry {
                state: initial,
                handle: None,
                last_result: None,
                finished_at: None,
            },
        );

        let observer = TrackedExecution {
            jobs: Arc::clone(&self.jobs),
            tracking_id: tracking_id.clone(),
        };
        let executor = self.executor.clone();

        let task = tokio::spawn(async move {
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
                if !observer.transition(QueueState::Enqueued) {
                    return;
                }
            }
            executor
                .run_on_demand(submission.job, submission.context, &observer)
                .await;
        });

        if let Some(mut entry) = self.jobs.get_mut(&tracking_id) {
            entry.handle = Some(task.abort_handle());
        }

        tracking_id
    }
}

#[async_trait]
impl JobBackend for InMemoryBackend {
    async fn add_or_update_recurring(
        &self,
        registration: RecurringRegistration,
    ) -> Result<(), JobError> {
        let executor = self.executor.clone();
        let job = Arc::clone(&registration.job);
        let cron = registration.cron.clone();
        let schedule = cron.engine_schedule();

        let cron_job = CronJob::new_async(schedule.as_str(), move |_uuid, _lock| {
            let executor = executor.clone();
            let job = Arc::clone(&job);
            let due = !cron.restricts_both_days() || cron.matches(Timestamp::now());

            Box::pin(async move {
                if due {
                    executor.run_recurring(job).await;
                }
            })
        })
        .map_err(|e| JobError::InvalidCronExpression {
            expression: registration.cron.to_string(),
            reason: e.to_string(),
        })?;

        let scheduler = self.cron.lock().await;

        if let Some((_, previous)) = self.recurring.remove(&registration.job_id) {
            scheduler
                .remove(&previous)
                .await
                .map_err(|e| JobError::backend_with("Failed to replace recurring schedule", e))?;
        }

        let uuid = scheduler
            .add(cron_job)
            .await
            .map_err(|e| JobError::backend_with("Failed to add recurring schedule", e))?;
        self.recurring.insert(registration.job_id, uuid);

        Ok(())
    }

    async fn remove_recurring(&self, job_id: &str) -> Result<bool, JobError> {
        let scheduler = self.cron.lock().await;

        match self.recurring.remove(job_id) {
            Some((_, uuid)) => {
                scheduler
                    .remove(&uuid)
                    .await
                    .map_err(|e| JobError::backend_with("Failed to remove recurring schedule", e))?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn enqueue(&self, submission: Submission) -> Result<TrackingId, JobError> {
        Ok(self.submit(submission, None))
    }

    async fn schedule(
        &self,
        submission: Submission,
        delay: Duration,
    ) -> Result<TrackingId, JobError> {
        Ok(self.submit(submission, Some(delay)))
    }

    async fn delete(&self, tracking_id: &TrackingId) -> Result<bool, JobError> {
        let Some(mut entry) = self.jobs.get_mut(tracking_id) else {
            return Ok(false);
        };

        if !entry.state.is_waiting() {
            return Ok(false);
        }

        entry.set_state(QueueState::Deleted);
        if let Some(handle) = entry.handle.take() {
            handle.abort();
        }
        Ok(true)
    }

    async fn state_name(&self, tracking_id: &TrackingId) -> Result<Option<String>, JobError> {
        Ok(self
            .jobs
            .get(tracking_id)
            .map(|entry| entry.state.as_str().to_string()))
    }

    async fn pause(&self) -> Result<(), JobError> {
        self.pause.pause();
        Ok(())
    }

    async fn resume(&self) -> Result<(), JobError> {
        self.pause.resume();
        Ok(())
    }
}
