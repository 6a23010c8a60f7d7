use std::any::TypeId;
use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;

use crate::jobs::error::JobError;
use crate::jobs::job::{OnDemandJob, RecurringJob};

type RecurringFactory = Box<dyn Fn() -> Result<Arc<dyn RecurringJob>, JobError> + Send + Sync>;
type OnDemandFactory = Box<dyn Fn() -> Result<Arc<dyn OnDemandJob>, JobError> + Send + Sync>;

/// Registry mapping job types to factories that build fresh descriptors
pub struct JobRegistry {
    recurring: HashMap<TypeId, RecurringFactory>,
    on_demand: HashMap<TypeId, OnDemandFactory>,
}

/// Summary of a registered descriptor, for listings
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum JobDescriptorInfo {
    Recurring {
        job_id: String,
        job_name: String,
        cron_expression: String,
        enabled: bool,
        description: String,
    },
    OnDemand {
        job_id: String,
        job_name: String,
        max_retry_attempts: u32,
        execution_timeout_secs: u64,
        description: String,
    },
}

impl JobRegistry {
    pub fn new() -> Self {
        Self {
            recurring: HashMap::new(),
            on_demand: HashMap::new(),
        }
    }

    /// Register a recurring job type with the registry
    pub fn register_recurring<T, F>(&mut self, factory: F) -> &mut Self
    where
        T: RecurringJob + 'static,
        F: Fn() -> Result<T, JobError> + Send + Sync + 'static,
    {
        let factory: RecurringFactory =
            Box::new(move || factory().map(|job| Arc::new(job) as Arc<dyn RecurringJob>));
        self.recurring.insert(TypeId::of::<T>(), factory);
        self
    }

    /// Register an on-demand job type with the registry
    pub fn register_on_demand<T, F>(&mut self, factory: F) -> &mut Self
    where
        T: OnDemandJob + 'static,
        F: Fn() -> Result<T, JobError> + Send + Sync + 'static,
    {
        let factory: OnDemandFactory =
            Box::new(move || factory().map(|job| Arc::new(job) as Arc<dyn OnDemandJob>));
        self.on_demand.insert(TypeId::of::<T>(), factory);
        self
    }

    /// Build a fresh instance of recurring job type `T`
    pub fn resolve_recurring<T: RecurringJob + 'static>(
        &self,
    ) -> Result<Arc<dyn RecurringJob>, JobError> {
        let factory = self
            .recurring
            .get(&TypeId::of::<T>())
            .ok_or_else(JobError::resolution::<T>)?;

        factory()
    }

    /// Build a fresh instance of on-demand job type `T`
    pub fn resolve_on_demand<T: OnDemandJob + 'static>(
        &self,
    ) -> Result<Arc<dyn OnDemandJob>, JobError> {
        let factory = self
            .on_demand
            .get(&TypeId::of::<T>())
            .ok_or_else(JobError::resolution::<T>)?;

        factory()
    }

    /// Describe every registered job, sorted by job id
    pub fn descriptors(&self) -> Result<Vec<JobDescriptorInfo>, JobError> {
        let mut infos = Vec::with_capacity(self.recurring.len() + self.on_demand.len());

        for factory in self.recurring.values() {
            let job = factory()?;
            infos.push(JobDescriptorInfo::Recurring {
                job_id: job.job_id().to_string(),
                job_name: job.job_name().to_string(),
                cron_expression: job.cron_expression().to_string(),
                enabled: job.is_enabled(),
                description: job.description().to_string(),
            });
        }

        for factory in self.on_demand.values() {
            let job = factory()?;
            infos.push(JobDescriptorInfo::OnDemand {
                job_id: job.job_id().to_string(),
                job_name: job.job_name().to_string(),
                max_retry_attempts: job.max_retry_attempts(),
                execution_timeout_secs: job.execution_timeout().as_secs(),
                description: job.description().to_string(),
            });
        }

        infos.sort_by(|a, b| a.job_id().cmp(b.job_id()));
        Ok(infos)
    }
}

impl JobDescriptorInfo {
    pub fn job_id(&self) -> &str {
        match self {
            JobDescriptorInfo::Recurring { job_id, .. } | JobDescriptorInfo::OnDemand { job_id, .. } => {
                job_id
            }
        }
    }
}

impl Default for JobRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::job::Job;
    use crate::jobs::types::{JobExecutionContext, JobResult};
    use async_trait::async_trait;

    #[derive(Debug)]
    struct Nightly;

    #[async_trait]
    impl Job for Nightly {
        fn job_id(&self) -> &str {
            "nightly"
        }

        fn job_name(&self) -> &str {
            "Nightly"
        }

        async fn execute(&self, _ctx: &JobExecutionContext) -> Result<JobResult, JobError> {
            Ok(JobResult::success("ok"))
        }
    }

    impl RecurringJob for Nightly {
        fn cron_expression(&self) -> &str {
            "0 3 * * *"
        }
    }

    #[derive(Debug)]
    struct Unregistered;

    #[async_trait]
    impl Job for Unregistered {
        fn job_id(&self) -> &str {
            "unregistered"
        }

        fn job_name(&self) -> &str {
            "Unregistered"
        }

        async fn execute(&self, _ctx: &JobExecutionContext) -> Result<JobResult, JobError> {
            Ok(JobResult::success("ok"))
        }
    }

    impl RecurringJob for Unregistered {
        fn cron_expression(&self) -> &str {
            "* * * * *"
        }
    }

    #[test]
    fn test_resolve_registered_type() {
        let mut registry = JobRegistry::new();
        registry.register_recurring(|| Ok(Nightly));

        let job = registry.resolve_recurring::<Nightly>().unwrap();
        assert_eq!(job.job_id(), "nightly");
        assert_eq!(job.cron_expression(), "0 3 * * *");
    }

    #[test]
    fn test_resolve_unregistered_type_is_resolution_error() {
        let registry = JobRegistry::new();
        let err = registry.resolve_recurring::<Unregistered>().unwrap_err();
        assert!(matches!(err, JobError::Resolution { ref job_type } if job_type.contains("Unregistered")));
    }

    #[test]
    fn test_failing_factory_propagates() {
        let mut registry = JobRegistry::new();
        registry.register_recurring::<Nightly, _>(|| Err(JobError::validation("cron", "bad")));
        assert!(matches!(
            registry.resolve_recurring::<Nightly>(),
            Err(JobError::Validation { .. })
        ));
    }

    #[test]
    fn test_descriptors_lists_registered_jobs() {
        let mut registry = JobRegistry::new();
        registry.register_recurring(|| Ok(Nightly));

        let infos = registry.descriptors().unwrap();
        assert_eq!(infos.len(), 1);
        assert_eq!(infos[0].job_id(), "nightly");
    }
}
