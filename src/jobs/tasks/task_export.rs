use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;

use crate::config::OnDemandJobConfig;
use crate::jobs::error::JobError;
use crate::jobs::job::{Job, OnDemandJob};
use crate::jobs::tasks::{SampleTask, sample_tasks, simulate_work};
use crate::jobs::types::{JobExecutionContext, JobResult, JobValue};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExportFormat {
    #[default]
    Csv,
    Json,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "json" => Ok(ExportFormat::Json),
            _ => Err(format!("format '{}' is not supported, expected csv or json", s)),
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Exports a user's tasks as CSV or JSON.
///
/// The user comes from the context attribution, falling back to `userId`
/// in the payload.
#[derive(Debug, Clone)]
pub struct TaskExportJob {
    max_retry_attempts: u32,
    timeout: Duration,
    latency: Duration,
}

impl TaskExportJob {
    pub fn new(config: &OnDemandJobConfig, latency: Duration) -> Self {
        Self {
            max_retry_attempts: config.max_retry_attempts,
            timeout: config.execution_timeout(),
            latency,
        }
    }
}

fn render(tasks: &[SampleTask], format: ExportFormat) -> Result<String, JobError> {
    match format {
        ExportFormat::Json => Ok(serde_json::to_string_pretty(tasks)?),
        ExportFormat::Csv => {
            let mut out = String::from("id,title,createdAt,dueAt,completedAt\n");
            for task in tasks {
                let optional = |ts: Option<jiff::Timestamp>| ts.map(|t| t.to_string()).unwrap_or_default();
                out.push_str(&format!(
                    "{},\"{}\",{},{},{}\n",
                    task.id,
                    task.title.replace('"', "\"\""),
                    task.created_at,
                    optional(task.due_at),
                    optional(task.completed_at),
                ));
            }
            Ok(out)
        }
    }
}

#[async_trait]
impl Job for TaskExportJob {
    fn job_id(&self) -> &str {
        "task-export"
    }

    fn job_name(&self) -> &str {
        "Task Export"
    }

    fn description(&self) -> &str {
        "Exports a user's tasks to CSV or JSON"
    }

    async fn execute(&self, ctx: &JobExecutionContext) -> Result<JobResult, JobError> {
        let user_id = match ctx.user_id.as_deref().map(str::trim).filter(|id| !id.is_empty()) {
            Some(id) => id,
            None => match ctx.required_str("userId") {
                Ok(id) => id,
                Err(reason) => return Ok(JobResult::validation_failure(reason)),
            },
        };
        let format = match ctx.optional_str("format").map(str::parse::<ExportFormat>) {
            None => ExportFormat::default(),
            Some(Ok(format)) => format,
            Some(Err(reason)) => return Ok(JobResult::validation_failure(reason)),
        };

        simulate_work(self.latency).await;
        let tasks: Vec<SampleTask> = sample_tasks(ctx.started_at)
            .into_iter()
            .filter(|task| task.owner_id == user_id)
            .collect();
        let body = render(&tasks, format)?;

        let file_name = format!(
            "tasks-{}-{}.{}",
            user_id,
            ctx.started_at.as_second(),
            format.extension()
        );
        tracing::debug!(
            execution_id = %ctx.job_id,
            user_id,
            file_name = %file_name,
            bytes = body.len(),
            "Task export written"
        );

        let data = HashMap::from([
            ("UserId".to_string(), JobValue::from(user_id)),
            ("Format".to_string(), JobValue::from(format.to_string())),
            ("TaskCount".to_string(), JobValue::from(tasks.len() as i64)),
            ("FileName".to_string(), JobValue::from(file_name)),
            ("SizeBytes".to_string(), JobValue::from(body.len() as i64)),
        ]);

        Ok(JobResult::success(format!(
            "Exported {} tasks for user {} as {}",
            tasks.len(),
            user_id,
            format
        ))
        .with_result_data(data))
    }
}

impl OnDemandJob for TaskExportJob {
    fn max_retry_attempts(&self) -> u32 {
        self.max_retry_attempts
    }

    fn execution_timeout(&self) -> Duration {
        self.timeout
    }
}
