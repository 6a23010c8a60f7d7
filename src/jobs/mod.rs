//! Background job execution.
//!
//! Job descriptors ([`RecurringJob`], [`OnDemandJob`]) are registered in a
//! [`JobRegistry`] and submitted through the [`JobScheduler`] facade to a
//! pluggable [`JobBackend`]. [`InMemoryBackend`] runs everything in-process.

pub mod backend;
pub mod cron;
pub mod error;
pub mod executor;
pub mod job;
pub mod memory;
pub mod registry;
pub mod scheduler;
pub mod tasks;
pub mod types;

pub use backend::{JobBackend, RecurringRegistration, Submission};
pub use cron::CronExpression;
pub use error::JobError;
pub use executor::{
    ConcurrencyTracker, ExecutionObserver, JobExecutor, PauseGate, QueueState, RunGuard,
};
pub use job::{Job, OnDemandJob, RecurringJob, exponential_backoff};
pub use memory::InMemoryBackend;
pub use registry::{JobDescriptorInfo, JobRegistry};
pub use scheduler::JobScheduler;
pub use types::{
    Attribution, FailureKind, JobData, JobExecutionContext, JobResult, JobStatus, JobValue,
    TrackingId,
};
