use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;

use crate::config::OnDemandJobConfig;
use crate::jobs::error::JobError;
use crate::jobs::job::{Job, OnDemandJob};
use crate::jobs::tasks::simulate_work;
use crate::jobs::types::{JobExecutionContext, JobResult, JobValue};

/// Delays before the 1st, 2nd and later retries.
const RETRY_DELAYS: [Duration; 3] = [
    Duration::from_secs(60),
    Duration::from_secs(300),
    Duration::from_secs(900),
];

const DEFAULT_NOTIFICATION_TYPE: &str = "Updated";

/// Emails a task notification to a single recipient.
///
/// Expects `taskId` and `recipientEmail`; `taskTitle` and `notificationType`
/// are optional.
#[derive(Debug, Clone)]
pub struct TaskNotificationJob {
    max_retry_attempts: u32,
    timeout: Duration,
    latency: Duration,
}

impl TaskNotificationJob {
    pub fn new(config: &OnDemandJobConfig, latency: Duration) -> Self {
        Self {
            max_retry_attempts: config.max_retry_attempts,
            timeout: config.execution_timeout(),
            latency,
        }
    }
}

#[async_trait]
impl Job for TaskNotificationJob {
    fn job_id(&self) -> &str {
        "task-notification"
    }

    fn job_name(&self) -> &str {
        "Task Notification"
    }

    fn description(&self) -> &str {
        "Sends a task notification email"
    }

    async fn execute(&self, ctx: &JobExecutionContext) -> Result<JobResult, JobError> {
        let task_id = match ctx.required_str("taskId") {
            Ok(id) => id,
            Err(reason) => return Ok(JobResult::validation_failure(reason)),
        };
        let recipient = match ctx.required_str("recipientEmail") {
            Ok(email) => email,
            Err(reason) => return Ok(JobResult::validation_failure(reason)),
        };
        let notification_type = ctx
            .optional_str("notificationType")
            .unwrap_or(DEFAULT_NOTIFICATION_TYPE);
        let title = ctx.optional_str("taskTitle");

        simulate_work(self.latency).await;
        tracing::debug!(
            execution_id = %ctx.job_id,
            task_id,
            recipient,
            notification_type,
            "Notification email sent"
        );

        let mut data = HashMap::from([
            ("SentTo".to_string(), JobValue::from(recipient)),
            ("NotificationType".to_string(), JobValue::from(notification_type)),
            ("TaskId".to_string(), JobValue::from(task_id)),
        ]);
        if let Some(title) = title {
            data.insert("TaskTitle".to_string(), JobValue::from(title));
        }

        let subject = title.map_or_else(|| format!("task {}", task_id), |t| format!("'{}'", t));
        Ok(JobResult::success(format!(
            "{} notification for {} sent to {}",
            notification_type, subject, recipient
        ))
        .with_result_data(data))
    }
}

impl OnDemandJob for TaskNotificationJob {
    fn max_retry_attempts(&self) -> u32 {
        self.max_retry_attempts
    }

    fn execution_timeout(&self) -> Duration {
        self.timeout
    }

    fn on_retry(&self, attempt: u32, error: &JobError) -> Duration {
        let index = (attempt.max(1) as usize - 1).min(RETRY_DELAYS.len() - 1);
        tracing::debug!(job_id = %self.job_id(), attempt, error = %error, "Scheduling retry");
        RETRY_DELAYS[index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::types::{FailureKind, JobData};

    fn job() -> TaskNotificationJob {
        let config = OnDemandJobConfig {
            max_retry_attempts: 3,
            timeout_seconds: 60,
        };
        TaskNotificationJob::new(&config, Duration::ZERO)
    }

    fn context(pairs: &[(&str, &str)]) -> JobExecutionContext {
        let data: JobData = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), JobValue::from(*v)))
            .collect();
        JobExecutionContext::new("Task Notification", data)
    }

    #[tokio::test]
    async fn test_sends_notification() {
        let ctx = context(&[
            ("taskId", "42"),
            ("taskTitle", "Write design doc"),
            ("notificationType", "Created"),
            ("recipientEmail", "a@b.com"),
        ]);

        let result = job().execute(&ctx).await.unwrap();

        assert!(result.is_success());
        assert!(result.message().contains("a@b.com"));
        let data = result.result_data().and_then(JobValue::as_map).unwrap();
        assert_eq!(data["SentTo"].as_str(), Some("a@b.com"));
        assert_eq!(data["NotificationType"].as_str(), Some("Created"));
        assert_eq!(data["TaskId"].as_str(), Some("42"));
    }

    #[tokio::test]
    async fn test_notification_type_defaults_to_updated() {
        let ctx = context(&[("taskId", "7"), ("recipientEmail", "ops@example.com")]);

        let result = job().execute(&ctx).await.unwrap();

        let data = result.result_data().and_then(JobValue::as_map).unwrap();
        assert_eq!(data["NotificationType"].as_str(), Some("Updated"));
        assert!(!data.contains_key("TaskTitle"));
    }

    #[tokio::test]
    async fn test_missing_recipient_fails_validation() {
        let ctx = context(&[("taskId", "42")]);

        let result = job().execute(&ctx).await.unwrap();

        assert!(!result.is_success());
        assert_eq!(result.error_message(), Some("recipientEmail is required"));
        assert_eq!(result.failure_kind(), Some(FailureKind::Validation));
        assert!(result.stack_trace().is_none());
    }

    #[tokio::test]
    async fn test_blank_task_id_fails_validation() {
        let ctx = context(&[("taskId", "   "), ("recipientEmail", "a@b.com")]);

        let result = job().execute(&ctx).await.unwrap();
        assert_eq!(result.error_message(), Some("taskId is required"));
    }

    #[test]
    fn test_retry_schedule() {
        let job = job();
        let error = JobError::execution("smtp unavailable");

        assert_eq!(job.on_retry(1, &error), Duration::from_secs(60));
        assert_eq!(job.on_retry(2, &error), Duration::from_secs(300));
        assert_eq!(job.on_retry(3, &error), Duration::from_secs(900));
        assert_eq!(job.on_retry(10, &error), Duration::from_secs(900));
    }
}
