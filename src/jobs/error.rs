use thiserror::Error;

use crate::jobs::types::{FailureKind, JobResult};

#[derive(Debug, Error)]
pub enum JobError {
    #[error("Job type could not be resolved: {job_type}")]
    Resolution { job_type: String },

    #[error("Validation failed for {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("Invalid cron expression '{expression}': {reason}")]
    InvalidCronExpression { expression: String, reason: String },

    #[error("Job backend error: {message}")]
    Backend {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    #[error("Job execution failed: {message}")]
    Execution {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    /// A failed attempt as seen by retry hooks
    #[error("{message}")]
    AttemptFailed { kind: FailureKind, message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl JobError {
    pub fn resolution<T: ?Sized>() -> Self {
        JobError::Resolution {
            job_type: std::any::type_name::<T>().to_string(),
        }
    }

    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        JobError::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn backend(message: impl Into<String>) -> Self {
        JobError::Backend {
            message: message.into(),
            source: None,
        }
    }

    pub fn backend_with(message: impl Into<String>, source: impl Into<anyhow::Error>) -> Self {
        JobError::Backend {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Error describing a failed attempt's result, keeping its failure kind
    pub fn attempt_failed(result: &JobResult) -> Self {
        JobError::AttemptFailed {
            kind: result.failure_kind().unwrap_or(FailureKind::Execution),
            message: result
                .error_message()
                .unwrap_or_else(|| result.message())
                .to_string(),
        }
    }

    pub fn execution(message: impl Into<String>) -> Self {
        JobError::Execution {
            message: message.into(),
            source: None,
        }
    }

    pub fn execution_with(message: impl Into<String>, source: impl Into<anyhow::Error>) -> Self {
        JobError::Execution {
            message: message.into(),
            source: Some(source.into()),
        }
    }
}
