//! Jobs command handler: lists registered job descriptors.

use std::fmt::Write;

use super::builtin_registry;
use crate::config::Settings;
use crate::jobs::JobDescriptorInfo;

pub struct JobsCommandHandler {
    config: Settings,
}

impl JobsCommandHandler {
    pub fn new(config: Settings) -> Self {
        Self { config }
    }

    pub fn execute(&self, json: bool) -> anyhow::Result<()> {
        let descriptors = builtin_registry(&self.config.jobs).descriptors()?;

        if json {
            for descriptor in &descriptors {
                println!("{}", serde_json::to_string(descriptor)?);
            }
        } else {
            print!("{}", render_table(&descriptors));
        }

        Ok(())
    }
}

fn render_table(descriptors: &[JobDescriptorInfo]) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<10} {:<18} {:<18} {:<22} {:<8} DESCRIPTION",
        "KIND", "ID", "NAME", "SCHEDULE", "ENABLED"
    );

    for descriptor in descriptors {
        let (kind, job_id, job_name, schedule, enabled, description) = match descriptor {
            JobDescriptorInfo::Recurring {
                job_id,
                job_name,
                cron_expression,
                enabled,
                description,
            } => (
                "recurring",
                job_id,
                job_name,
                cron_expression.clone(),
                if *enabled { "yes" } else { "no" },
                description,
            ),
            JobDescriptorInfo::OnDemand {
                job_id,
                job_name,
                max_retry_attempts,
                execution_timeout_secs,
                description,
            } => (
                "on-demand",
                job_id,
                job_name,
                format!("retries={} timeout={}s", max_retry_attempts, execution_timeout_secs),
                "-",
                description,
            ),
        };

        let _ = writeln!(
            out,
            "{:<10} {:<18} {:<18} {:<22} {:<8} {}",
            kind, job_id, job_name, schedule, enabled, description
        );
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_table() {
        let descriptors = builtin_registry(&Settings::default().jobs)
            .descriptors()
            .unwrap();
        let table = render_table(&descriptors);
        let lines: Vec<&str> = table.lines().collect();

        assert_eq!(lines.len(), 6);
        assert!(lines[0].starts_with("KIND"));
        assert!(lines[1].starts_with("recurring  data-cleanup"));
        assert!(lines[2].contains("retries=4 timeout=300s"));
        assert!(lines[5].contains("weekly-report"));
        assert!(lines[5].contains(" no "));
    }

    #[test]
    fn test_execute_json() {
        let handler = JobsCommandHandler::new(Settings::default());
        assert!(handler.execute(true).is_ok());
    }
}
