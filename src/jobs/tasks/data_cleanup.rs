use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use jiff::SignedDuration;

use crate::config::CleanupJobConfig;
use crate::jobs::error::JobError;
use crate::jobs::job::{Job, RecurringJob};
use crate::jobs::tasks::{sample_tasks, simulate_work};
use crate::jobs::types::{JobExecutionContext, JobResult, JobValue};

/// Purges completed tasks older than the retention window.
#[derive(Debug, Clone)]
pub struct DataCleanupJob {
    enabled: bool,
    cron: String,
    retention_days: u32,
    latency: Duration,
}

impl DataCleanupJob {
    pub fn new(config: &CleanupJobConfig, latency: Duration) -> Self {
        Self {
            enabled: config.enabled,
            cron: config.cron.clone(),
            retention_days: config.retention_days,
            latency,
        }
    }
}

#[async_trait]
impl Job for DataCleanupJob {
    fn job_id(&self) -> &str {
        "data-cleanup"
    }

    fn job_name(&self) -> &str {
        "Data Cleanup"
    }

    fn description(&self) -> &str {
        "Removes completed tasks past the retention window"
    }

    async fn execute(&self, ctx: &JobExecutionContext) -> Result<JobResult, JobError> {
        if self.retention_days == 0 {
            return Ok(JobResult::validation_failure("retention_days must be at least 1"));
        }

        let cutoff = ctx.started_at - SignedDuration::from_hours(i64::from(self.retention_days) * 24);

        simulate_work(self.latency).await;
        let purged: Vec<u32> = sample_tasks(ctx.started_at)
            .into_iter()
            .filter(|task| task.completed_at.is_some_and(|done| done < cutoff))
            .map(|task| task.id)
            .collect();

        tracing::debug!(
            execution_id = %ctx.job_id,
            cutoff = %cutoff,
            purged = ?purged,
            "Completed tasks selected for cleanup"
        );

        let data = HashMap::from([
            ("PurgedCount".to_string(), JobValue::from(purged.len() as i64)),
            ("RetentionDays".to_string(), JobValue::from(i64::from(self.retention_days))),
            ("Cutoff".to_string(), JobValue::from(cutoff)),
        ]);

        Ok(JobResult::success(format!(
            "Purged {} completed tasks older than {} days",
            purged.len(),
            self.retention_days
        ))
        .with_result_data(data))
    }
}

impl RecurringJob for DataCleanupJob {
    fn cron_expression(&self) -> &str {
        &self.cron
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }
}
