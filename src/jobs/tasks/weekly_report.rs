use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use jiff::SignedDuration;

use crate::config::ReportJobConfig;
use crate::jobs::error::JobError;
use crate::jobs::job::{Job, RecurringJob};
use crate::jobs::tasks::{sample_tasks, simulate_work};
use crate::jobs::types::{JobExecutionContext, JobResult, JobValue};

const REPORT_PERIOD: SignedDuration = SignedDuration::from_hours(7 * 24);

#[derive(Debug, Clone)]
pub struct WeeklyReportJob {
    enabled: bool,
    cron: String,
    latency: Duration,
}

impl WeeklyReportJob {
    pub fn new(config: &ReportJobConfig, latency: Duration) -> Self {
        Self {
            enabled: config.enabled,
            cron: config.cron.clone(),
            latency,
        }
    }
}

#[async_trait]
impl Job for WeeklyReportJob {
    fn job_id(&self) -> &str {
        "weekly-report"
    }

    fn job_name(&self) -> &str {
        "Weekly Report"
    }

    fn description(&self) -> &str {
        "Summarizes created, completed and overdue tasks over the past week"
    }

    async fn execute(&self, ctx: &JobExecutionContext) -> Result<JobResult, JobError> {
        let period_end = ctx.started_at;
        let period_start = period_end - REPORT_PERIOD;

        simulate_work(self.latency).await;
        let tasks = sample_tasks(period_end);

        let created = tasks.iter().filter(|t| t.created_at >= period_start).count();
        let completed = tasks
            .iter()
            .filter(|t| t.completed_at.is_some_and(|done| done >= period_start))
            .count();
        let overdue = tasks.iter().filter(|t| t.is_overdue(period_end)).count();

        let data = HashMap::from([
            ("Created".to_string(), JobValue::from(created as i64)),
            ("Completed".to_string(), JobValue::from(completed as i64)),
            ("Overdue".to_string(), JobValue::from(overdue as i64)),
            ("PeriodStart".to_string(), JobValue::from(period_start)),
            ("PeriodEnd".to_string(), JobValue::from(period_end)),
        ]);

        Ok(JobResult::success(format!(
            "Weekly report: {} created, {} completed, {} overdue",
            created, completed, overdue
        ))
        .with_result_data(data))
    }
}

impl RecurringJob for WeeklyReportJob {
    fn cron_expression(&self) -> &str {
        &self.cron
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_report_counts() {
        let job = WeeklyReportJob::new(&ReportJobConfig::default(), Duration::ZERO);
        let ctx = JobExecutionContext::new(job.job_name(), Default::default());

        let result = job.execute(&ctx).await.unwrap();

        assert!(result.is_success());
        assert!(result.error_message().is_none());
        assert_eq!(
            result.message(),
            "Weekly report: 4 created, 1 completed, 1 overdue"
        );
    }

    #[test]
    fn test_disabled_by_default() {
        let job = WeeklyReportJob::new(&ReportJobConfig::default(), Duration::ZERO);
        assert!(!job.is_enabled());
        assert_eq!(job.cron_expression(), "0 8 * * 1");
    }
}
