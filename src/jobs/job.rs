use std::time::Duration;

use async_trait::async_trait;

use crate::jobs::error::JobError;
use crate::jobs::types::{JobExecutionContext, JobResult};

/// Capabilities shared by every job descriptor.
#[async_trait]
pub trait Job: Send + Sync + std::fmt::Debug {
    /// Stable identity of the job type.
    fn job_id(&self) -> &str;

    fn job_name(&self) -> &str;

    fn description(&self) -> &str {
        ""
    }

    /// Runs the unit of work.
    ///
    /// Expected failures come back as `Ok` with a failed [`JobResult`];
    /// `Err` is reserved for unrecoverable errors.
    async fn execute(&self, ctx: &JobExecutionContext) -> Result<JobResult, JobError>;

    /// Checked right before each attempt. Returning `false` skips the attempt.
    async fn can_execute(&self) -> bool {
        true
    }

    /// Observes the result of every attempt that produced one.
    async fn on_completed(&self, result: &JobResult) {
        if result.is_success() {
            tracing::info!(
                job_id = %self.job_id(),
                duration_ms = result.duration_ms(),
                message = %result.message(),
                "Job completed"
            );
        } else {
            tracing::warn!(
                job_id = %self.job_id(),
                duration_ms = result.duration_ms(),
                retry_count = result.retry_count(),
                error = result.error_message().unwrap_or_default(),
                "Job attempt failed"
            );
        }
    }
}

/// Job driven by a cron schedule.
pub trait RecurringJob: Job {
    /// Standard 5-field cron expression, evaluated in UTC.
    fn cron_expression(&self) -> &str;

    fn is_enabled(&self) -> bool {
        true
    }
}

/// Job triggered per call, with its own retry policy.
pub trait OnDemandJob: Job {
    fn max_retry_attempts(&self) -> u32;

    fn execution_timeout(&self) -> Duration;

    /// Delay before the attempt following failed attempt number `attempt`.
    fn on_retry(&self, attempt: u32, error: &JobError) -> Duration {
        tracing::debug!(job_id = %self.job_id(), attempt, error = %error, "Scheduling retry");
        exponential_backoff(attempt)
    }
}

/// `2^(attempt-1)` seconds: 1s, 2s, 4s, 8s, ...
pub fn exponential_backoff(attempt: u32) -> Duration {
    let exponent = attempt.saturating_sub(1).min(32);
    Duration::from_secs(1u64 << exponent)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_exponential_backoff_first_attempts() {
        let delays: Vec<u64> = (1..=4).map(|n| exponential_backoff(n).as_secs()).collect();
        assert_eq!(delays, vec![1, 2, 4, 8]);
    }

    #[test]
    fn test_exponential_backoff_attempt_zero_is_one_second() {
        assert_eq!(exponential_backoff(0), Duration::from_secs(1));
    }

    proptest! {
        #[test]
        fn prop_backoff_doubles_each_attempt(n in 1u32..30) {
            prop_assert_eq!(exponential_backoff(n + 1), exponential_backoff(n) * 2);
            prop_assert_eq!(exponential_backoff(n).as_secs(), 2u64.pow(n - 1));
        }
    }
}
