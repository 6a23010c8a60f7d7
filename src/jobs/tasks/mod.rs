//! Built-in job implementations.
//!
//! Every job follows the same shape: validate the input, perform the work
//! (simulated latency over canned task data), and summarize it in a
//! [`JobResult`](crate::jobs::JobResult).

mod data_cleanup;
mod task_export;
mod task_notification;
mod task_reminder;
mod weekly_report;

pub use data_cleanup::DataCleanupJob;
pub use task_export::{ExportFormat, TaskExportJob};
pub use task_notification::TaskNotificationJob;
pub use task_reminder::TaskReminderJob;
pub use weekly_report::WeeklyReportJob;

use std::time::Duration;

use jiff::{SignedDuration, Timestamp};
use serde::Serialize;

use crate::config::JobsConfig;
use crate::jobs::error::JobError;
use crate::jobs::registry::JobRegistry;
use crate::jobs::scheduler::JobScheduler;

/// A task record as seen by the built-in jobs.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SampleTask {
    pub id: u32,
    pub title: &'static str,
    pub owner_id: &'static str,
    pub created_at: Timestamp,
    pub due_at: Option<Timestamp>,
    pub completed_at: Option<Timestamp>,
}

impl SampleTask {
    pub fn is_open(&self) -> bool {
        self.completed_at.is_none()
    }

    pub fn is_overdue(&self, now: Timestamp) -> bool {
        self.is_open() && self.due_at.is_some_and(|due| due < now)
    }
}

/// Canned task data, positioned relative to `now`.
pub fn sample_tasks(now: Timestamp) -> Vec<SampleTask> {
    let hours = |h: i64| now + SignedDuration::from_hours(h);

    vec![
        SampleTask {
            id: 1,
            title: "Write design doc",
            owner_id: "user-1",
            created_at: hours(-48),
            due_at: Some(hours(6)),
            completed_at: None,
        },
        SampleTask {
            id: 2,
            title: "Review pull request",
            owner_id: "user-2",
            created_at: hours(-720),
            due_at: Some(hours(-704)),
            completed_at: Some(hours(-700)),
        },
        SampleTask {
            id: 3,
            title: "Plan sprint",
            owner_id: "user-1",
            created_at: hours(-30),
            due_at: Some(hours(-2)),
            completed_at: None,
        },
        SampleTask {
            id: 4,
            title: "Update docs",
            owner_id: "user-2",
            created_at: hours(-1000),
            due_at: None,
            completed_at: Some(hours(-960)),
        },
        SampleTask {
            id: 5,
            title: "Fix login bug",
            owner_id: "user-1",
            created_at: hours(-10),
            due_at: Some(hours(12)),
            completed_at: Some(hours(-1)),
        },
        SampleTask {
            id: 6,
            title: "Prepare demo",
            owner_id: "user-1",
            created_at: hours(-4),
            due_at: Some(hours(30)),
            completed_at: None,
        },
    ]
}

async fn simulate_work(latency: Duration) {
    if !latency.is_zero() {
        tokio::time::sleep(latency).await;
    }
}

/// Register every built-in job, configured from `config`.
pub fn register_builtin_jobs(registry: &mut JobRegistry, config: &JobsConfig) {
    let latency = config.simulated_latency();

    let cleanup = config.cleanup.clone();
    registry.register_recurring(move || Ok(DataCleanupJob::new(&cleanup, latency)));

    let reminders = config.reminders.clone();
    registry.register_recurring(move || Ok(TaskReminderJob::new(&reminders, latency)));

    let reports = config.reports.clone();
    registry.register_recurring(move || Ok(WeeklyReportJob::new(&reports, latency)));

    let notifications = config.notifications.clone();
    registry.register_on_demand(move || Ok(TaskNotificationJob::new(&notifications, latency)));

    let exports = config.exports.clone();
    registry.register_on_demand(move || Ok(TaskExportJob::new(&exports, latency)));
}

/// Register the cron schedule of every built-in recurring job.
///
/// Disabled jobs are skipped by the scheduler. Returns the job ids seen.
pub async fn schedule_recurring_jobs(scheduler: &JobScheduler) -> Result<Vec<String>, JobError> {
    Ok(vec![
        scheduler.schedule_cron_job::<DataCleanupJob>().await?,
        scheduler.schedule_cron_job::<TaskReminderJob>().await?,
        scheduler.schedule_cron_job::<WeeklyReportJob>().await?,
    ])
}
