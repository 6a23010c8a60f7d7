use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashSet;
use futures::FutureExt;
use tokio::sync::watch;
use tokio::time::Instant;

use crate::jobs::error::JobError;
use crate::jobs::job::{Job, OnDemandJob, RecurringJob, exponential_backoff};
use crate::jobs::types::{JobData, JobExecutionContext, JobResult};

/// Native states of the in-process queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueState {
    Enqueued,
    Scheduled,
    Processing,
    Awaiting,
    Succeeded,
    Failed,
    Deleted,
}

impl QueueState {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueueState::Enqueued => "Enqueued",
            QueueState::Scheduled => "Scheduled",
            QueueState::Processing => "Processing",
            QueueState::Awaiting => "Awaiting",
            QueueState::Succeeded => "Succeeded",
            QueueState::Failed => "Failed",
            QueueState::Deleted => "Deleted",
        }
    }

    /// Succeeded, failed or deleted; no further transitions follow.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            QueueState::Succeeded | QueueState::Failed | QueueState::Deleted
        )
    }

    /// Work that has not started and may still be removed.
    pub fn is_waiting(&self) -> bool {
        matches!(
            self,
            QueueState::Enqueued | QueueState::Scheduled | QueueState::Awaiting
        )
    }
}

/// Receives state changes for one on-demand execution.
pub trait ExecutionObserver: Send + Sync {
    /// Records a transition. Returns `false` when the job was removed in the
    /// meantime and must not continue.
    fn transition(&self, state: QueueState) -> bool;

    fn record(&self, _result: &JobResult) {}
}

/// Process-wide pause switch shared by every worker task.
#[derive(Clone)]
pub struct PauseGate {
    sender: Arc<watch::Sender<bool>>,
}

impl PauseGate {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(false);
        Self {
            sender: Arc::new(sender),
        }
    }

    pub fn pause(&self) {
        self.sender.send_replace(true);
    }

    pub fn resume(&self) {
        self.sender.send_replace(false);
    }

    pub fn is_paused(&self) -> bool {
        *self.sender.borrow()
    }

    /// Returns once the gate is open.
    pub async fn wait_until_running(&self) {
        let mut receiver = self.sender.subscribe();
        // Err only when the sender is gone, and `self` holds it.
        let _ = receiver.wait_for(|paused| !*paused).await;
    }
}

impl Default for PauseGate {
    fn default() -> Self {
        Self::new()
    }
}

/// Tracks in-flight recurring runs so a schedule never overlaps itself
#[derive(Clone, Default)]
pub struct ConcurrencyTracker {
    running: Arc<DashSet<String>>,
}

impl ConcurrencyTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks `job_id` as running until the returned guard is dropped.
    /// Returns `None` if it already was.
    pub fn try_begin(&self, job_id: &str) -> Option<RunGuard> {
        if !self.running.insert(job_id.to_string()) {
            return None;
        }
        Some(RunGuard {
            running: Arc::clone(&self.running),
            job_id: job_id.to_string(),
        })
    }
}

/// Clears the in-flight mark on drop, unwinding included.
pub struct RunGuard {
    running: Arc<DashSet<String>>,
    job_id: String,
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        self.running.remove(&self.job_id);
    }
}

/// Executes jobs with retry, timeout, and overlap control
#[derive(Clone)]
pub struct JobExecutor {
    pause: PauseGate,
    concurrency: ConcurrencyTracker,
}

impl JobExecutor {
    pub fn new(pause: PauseGate) -> Self {
        Self {
            pause,
            concurrency: ConcurrencyTracker::new(),
        }
    }

    /// Runs an on-demand submission until it succeeds, fails terminally,
    /// is skipped, or is removed. Returns the last attempt's result.
    pub async fn run_on_demand(
        &self,
        job: Arc<dyn OnDemandJob>,
        ctx: JobExecutionContext,
        observer: &dyn ExecutionObserver,
    ) -> Option<JobResult> {
        let mut attempt: u32 = 1;

        loop {
            self.pause.wait_until_running().await;

            let allowed = contain_hook(job.job_id(), "can_execute", job.can_execute())
                .await
                .unwrap_or(false);
            if !allowed {
                tracing::info!(
                    job_id = %job.job_id(),
                    execution_id = %ctx.job_id,
                    attempt,
                    "Job precondition not met, skipping"
                );
                observer.transition(QueueState::Deleted);
                return None;
            }

            if !observer.transition(QueueState::Processing) {
                return None;
            }

            let result = execute_attempt(
                Arc::clone(&job),
                ctx.clone(),
                Some(job.execution_timeout()),
                attempt - 1,
            )
            .await;
            observer.record(&result);
            contain_hook(job.job_id(), "on_completed", job.on_completed(&result)).await;

            if result.is_success() {
                observer.transition(QueueState::Succeeded);
                return Some(result);
            }

            if result.is_retryable() && attempt <= job.max_retry_attempts() {
                let error = JobError::attempt_failed(&result);
                let delay =
                    std::panic::catch_unwind(AssertUnwindSafe(|| job.on_retry(attempt, &error)))
                        .unwrap_or_else(|_| {
                            tracing::error!(
                                job_id = %job.job_id(),
                                hook = "on_retry",
                                "Job hook panicked"
                            );
                            exponential_backoff(attempt)
                        });
                tracing::warn!(
                    job_id = %job.job_id(),
                    execution_id = %ctx.job_id,
                    attempt,
                    max_retry_attempts = job.max_retry_attempts(),
                    delay_secs = delay.as_secs_f64(),
                    error = %error,
                    "Job attempt failed, retrying"
                );

                if !observer.transition(QueueState::Awaiting) {
                    return Some(result);
                }
                tokio::time::sleep(delay).await;
                attempt += 1;
                continue;
            }

            tracing::error!(
                job_id = %job.job_id(),
                execution_id = %ctx.job_id,
                attempts = attempt,
                error = result.error_message().unwrap_or_default(),
                "Job failed"
            );
            observer.transition(QueueState::Failed);
            return Some(result);
        }
    }

    /// Runs one firing of a recurring schedule.
    ///
    /// Skipped while paused or while the previous firing is still running.
    pub async fn run_recurring(&self, job: Arc<dyn RecurringJob>) -> Option<JobResult> {
        if self.pause.is_paused() {
            tracing::info!(job_id = %job.job_id(), "Scheduler paused, skipping recurring run");
            return None;
        }

        let Some(_running) = self.concurrency.try_begin(job.job_id()) else {
            tracing::warn!(job_id = %job.job_id(), "Previous run still in flight, skipping");
            return None;
        };

        let allowed = contain_hook(job.job_id(), "can_execute", job.can_execute())
            .await
            .unwrap_or(false);
        if !allowed {
            tracing::info!(job_id = %job.job_id(), "Job precondition not met, skipping");
            return None;
        }

        let ctx = JobExecutionContext::new(job.job_name(), JobData::new());
        tracing::info!(job_id = %job.job_id(), execution_id = %ctx.job_id, "Recurring job started");
        let result = execute_attempt(Arc::clone(&job), ctx, None, 0).await;
        contain_hook(job.job_id(), "on_completed", job.on_completed(&result)).await;
        Some(result)
    }
}

/// Awaits a lifecycle hook. A panic is logged and yields `None`.
async fn contain_hook<F>(job_id: &str, hook: &'static str, future: F) -> Option<F::Output>
where
    F: Future,
{
    match AssertUnwindSafe(future).catch_unwind().await {
        Ok(output) => Some(output),
        Err(_) => {
            tracing::error!(job_id, hook, "Job hook panicked");
            None
        }
    }
}

/// Runs `execute` on its own task so that a panic or an overrun is contained
/// to the attempt.
async fn execute_attempt<J>(
    job: Arc<J>,
    ctx: JobExecutionContext,
    timeout: Option<Duration>,
    retry_count: u32,
) -> JobResult
where
    J: Job + ?Sized + 'static,
{
    let start_time = Instant::now();
    let job_name = job.job_name().to_string();

    let mut handle = tokio::spawn(async move { job.execute(&ctx).await });

    let joined = match timeout {
        Some(limit) => match tokio::time::timeout(limit, &mut handle).await {
            Ok(joined) => joined,
            Err(_) => {
                handle.abort();
                return JobResult::timed_out(limit)
                    .with_duration_ms(elapsed_ms(start_time))
                    .with_retry_count(retry_count);
            }
        },
        None => handle.await,
    };

    let result = match joined {
        Ok(Ok(result)) => result,
        Ok(Err(e)) => {
            tracing::error!(job = %job_name, error = %e, "Job returned an unrecoverable error");
            JobResult::from_error(format!("{} failed", job_name), &e)
        }
        Err(e) => {
            tracing::error!(job = %job_name, error = %e, "Job task aborted");
            JobResult::failure(format!("{} aborted", job_name), e.to_string())
        }
    };

    result
        .with_duration_ms(elapsed_ms(start_time))
        .with_retry_count(retry_count)
}

fn elapsed_ms(start_time: Instant) -> u64 {
    u64::try_from(start_time.elapsed().as_millis()).unwrap_or(u64::MAX)
}
