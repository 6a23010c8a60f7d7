use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use jiff::SignedDuration;

use crate::config::ReminderJobConfig;
use crate::jobs::error::JobError;
use crate::jobs::job::{Job, RecurringJob};
use crate::jobs::tasks::{sample_tasks, simulate_work};
use crate::jobs::types::{JobExecutionContext, JobResult, JobValue};

/// Sends reminders for open tasks coming due within the lookahead window.
#[derive(Debug, Clone)]
pub struct TaskReminderJob {
    enabled: bool,
    cron: String,
    lookahead_hours: u32,
    latency: Duration,
}

impl TaskReminderJob {
    pub fn new(config: &ReminderJobConfig, latency: Duration) -> Self {
        Self {
            enabled: config.enabled,
            cron: config.cron.clone(),
            lookahead_hours: config.lookahead_hours,
            latency,
        }
    }
}

#[async_trait]
impl Job for TaskReminderJob {
    fn job_id(&self) -> &str {
        "task-reminders"
    }

    fn job_name(&self) -> &str {
        "Task Reminders"
    }

    fn description(&self) -> &str {
        "Reminds owners of open tasks that are coming due"
    }

    async fn execute(&self, ctx: &JobExecutionContext) -> Result<JobResult, JobError> {
        let now = ctx.started_at;
        let horizon = now + SignedDuration::from_hours(i64::from(self.lookahead_hours));

        simulate_work(self.latency).await;
        let due_soon: Vec<_> = sample_tasks(now)
            .into_iter()
            .filter(|task| task.is_open())
            .filter(|task| task.due_at.is_some_and(|due| due >= now && due <= horizon))
            .collect();

        for task in &due_soon {
            tracing::debug!(task_id = task.id, owner_id = task.owner_id, "Reminder sent");
        }

        let task_ids: Vec<JobValue> = due_soon
            .iter()
            .map(|task| JobValue::from(i64::from(task.id)))
            .collect();
        let data = HashMap::from([
            ("RemindersSent".to_string(), JobValue::from(due_soon.len() as i64)),
            ("LookaheadHours".to_string(), JobValue::from(i64::from(self.lookahead_hours))),
            ("TaskIds".to_string(), JobValue::List(task_ids)),
        ]);

        Ok(JobResult::success(format!(
            "Sent {} reminders for tasks due within {}h",
            due_soon.len(),
            self.lookahead_hours
        ))
        .with_result_data(data))
    }
}

impl RecurringJob for TaskReminderJob {
    fn cron_expression(&self) -> &str {
        &self.cron
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }
}
