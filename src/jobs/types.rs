use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Untyped payload value carried in a job's execution context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum JobValue {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    Timestamp(Timestamp),
    String(String),
    List(Vec<JobValue>),
    Map(HashMap<String, JobValue>),
}

impl JobValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            JobValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            JobValue::Integer(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&HashMap<String, JobValue>> {
        match self {
            JobValue::Map(map) => Some(map),
            _ => None,
        }
    }
}

impl From<&str> for JobValue {
    fn from(value: &str) -> Self {
        JobValue::String(value.to_string())
    }
}

impl From<String> for JobValue {
    fn from(value: String) -> Self {
        JobValue::String(value)
    }
}

impl From<i64> for JobValue {
    fn from(value: i64) -> Self {
        JobValue::Integer(value)
    }
}

impl From<bool> for JobValue {
    fn from(value: bool) -> Self {
        JobValue::Bool(value)
    }
}

impl From<Timestamp> for JobValue {
    fn from(value: Timestamp) -> Self {
        JobValue::Timestamp(value)
    }
}

impl From<HashMap<String, JobValue>> for JobValue {
    fn from(value: HashMap<String, JobValue>) -> Self {
        JobValue::Map(value)
    }
}

impl From<serde_json::Value> for JobValue {
    fn from(value: serde_json::Value) -> Self {
        use serde_json::Value;

        match value {
            Value::Null => JobValue::Null,
            Value::Bool(b) => JobValue::Bool(b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => JobValue::Integer(i),
                None => JobValue::Float(n.as_f64().unwrap_or_default()),
            },
            Value::String(s) => JobValue::String(s),
            Value::Array(items) => JobValue::List(items.into_iter().map(JobValue::from).collect()),
            Value::Object(fields) => JobValue::Map(
                fields
                    .into_iter()
                    .map(|(key, value)| (key, JobValue::from(value)))
                    .collect(),
            ),
        }
    }
}

/// Caller-supplied payload, interpreted by the job.
pub type JobData = HashMap<String, JobValue>;

/// Optional attribution copied into the execution context.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attribution {
    pub user_id: Option<String>,
    pub tenant_id: Option<String>,
}

impl Attribution {
    pub fn user(user_id: impl Into<String>) -> Self {
        Self {
            user_id: Some(user_id.into()),
            tenant_id: None,
        }
    }

    pub fn with_tenant(mut self, tenant_id: impl Into<String>) -> Self {
        self.tenant_id = Some(tenant_id.into());
        self
    }
}

/// Input bundle handed to a single job execution.
///
/// `job_id` identifies this execution, not the job type and not the
/// backend's tracking id.
#[derive(Debug, Clone)]
pub struct JobExecutionContext {
    pub job_id: String,
    pub job_name: String,
    pub started_at: Timestamp,
    pub data: JobData,
    pub user_id: Option<String>,
    pub tenant_id: Option<String>,
}

impl JobExecutionContext {
    pub fn new(job_name: impl Into<String>, data: JobData) -> Self {
        Self {
            job_id: Uuid::new_v4().to_string(),
            job_name: job_name.into(),
            started_at: Timestamp::now(),
            data,
            user_id: None,
            tenant_id: None,
        }
    }

    pub fn with_attribution(mut self, attribution: Attribution) -> Self {
        self.user_id = attribution.user_id;
        self.tenant_id = attribution.tenant_id;
        self
    }

    pub fn get(&self, key: &str) -> Option<&JobValue> {
        self.data.get(key)
    }

    /// Returns the trimmed string under `key`, or `"<key> is required"`.
    pub fn required_str(&self, key: &str) -> Result<&str, String> {
        self.optional_str(key)
            .ok_or_else(|| format!("{} is required", key))
    }

    /// Returns the trimmed string under `key` when present and non-empty.
    pub fn optional_str(&self, key: &str) -> Option<&str> {
        self.data
            .get(key)
            .and_then(JobValue::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

/// Why an attempt failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureKind {
    Validation,
    Execution,
    Timeout,
}

/// Outcome of one job attempt.
///
/// Fields are private so that `success` always agrees with the absence of
/// `error_message` and `stack_trace`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobResult {
    success: bool,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stack_trace: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    failure_kind: Option<FailureKind>,
    duration_ms: u64,
    retry_count: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    result_data: Option<JobValue>,
    completed_at: Timestamp,
}

impl JobResult {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            error_message: None,
            stack_trace: None,
            failure_kind: None,
            duration_ms: 0,
            retry_count: 0,
            result_data: None,
            completed_at: Timestamp::now(),
        }
    }

    pub fn failure(message: impl Into<String>, error_message: impl Into<String>) -> Self {
        Self::failed(message.into(), error_message.into(), None, FailureKind::Execution)
    }

    /// Failed result for missing or malformed input.
    pub fn validation_failure(error_message: impl Into<String>) -> Self {
        Self::failed(
            "Validation failed".to_string(),
            error_message.into(),
            None,
            FailureKind::Validation,
        )
    }

    /// Failed result carrying the error and its source chain.
    pub fn from_error(message: impl Into<String>, error: &(dyn std::error::Error + 'static)) -> Self {
        Self::failed(
            message.into(),
            error.to_string(),
            Some(render_error_chain(error)),
            FailureKind::Execution,
        )
    }

    pub fn timed_out(timeout: Duration) -> Self {
        Self::failed(
            "Job execution timed out".to_string(),
            format!("Job execution timeout after {}s", timeout.as_secs_f64()),
            None,
            FailureKind::Timeout,
        )
    }

    fn failed(
        message: String,
        error_message: String,
        stack_trace: Option<String>,
        kind: FailureKind,
    ) -> Self {
        Self {
            success: false,
            message,
            error_message: Some(error_message),
            stack_trace,
            failure_kind: Some(kind),
            duration_ms: 0,
            retry_count: 0,
            result_data: None,
            completed_at: Timestamp::now(),
        }
    }

    pub fn with_result_data(mut self, data: impl Into<JobValue>) -> Self {
        self.result_data = Some(data.into());
        self
    }

    pub fn with_duration_ms(mut self, duration_ms: u64) -> Self {
        self.duration_ms = duration_ms;
        self
    }

    pub fn with_retry_count(mut self, retry_count: u32) -> Self {
        self.retry_count = retry_count;
        self
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub fn stack_trace(&self) -> Option<&str> {
        self.stack_trace.as_deref()
    }

    pub fn failure_kind(&self) -> Option<FailureKind> {
        self.failure_kind
    }

    pub fn duration_ms(&self) -> u64 {
        self.duration_ms
    }

    pub fn retry_count(&self) -> u32 {
        self.retry_count
    }

    pub fn result_data(&self) -> Option<&JobValue> {
        self.result_data.as_ref()
    }

    pub fn completed_at(&self) -> Timestamp {
        self.completed_at
    }

    /// Validation failures cannot be fixed by running the job again.
    pub fn is_retryable(&self) -> bool {
        !self.success && self.failure_kind != Some(FailureKind::Validation)
    }
}

fn render_error_chain(error: &(dyn std::error::Error + 'static)) -> String {
    let mut rendered = error.to_string();
    let mut source = error.source();
    let mut depth = 0;
    if source.is_some() {
        rendered.push_str("\n\nCaused by:");
    }
    while let Some(cause) = source {
        rendered.push_str(&format!("\n    {}: {}", depth, cause));
        depth += 1;
        source = cause.source();
    }
    rendered
}

/// Status reported to callers polling a tracking id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobStatus {
    Enqueued,
    Processing,
    Succeeded,
    Failed,
    Deleted,
    Awaiting,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobStatus::Succeeded | JobStatus::Failed | JobStatus::Deleted
        )
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobStatus::Enqueued => write!(f, "Enqueued"),
            JobStatus::Processing => write!(f, "Processing"),
            JobStatus::Succeeded => write!(f, "Succeeded"),
            JobStatus::Failed => write!(f, "Failed"),
            JobStatus::Deleted => write!(f, "Deleted"),
            JobStatus::Awaiting => write!(f, "Awaiting"),
        }
    }
}

/// Backend-assigned identifier of a submitted job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TrackingId(String);

impl TrackingId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TrackingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_str_rejects_missing_and_blank() {
        let mut data = JobData::new();
        data.insert("blank".to_string(), JobValue::from("   "));
        data.insert("number".to_string(), JobValue::from(42));
        data.insert("email".to_string(), JobValue::from(" a@b.com "));
        let ctx = JobExecutionContext::new("test", data);

        assert_eq!(ctx.required_str("missing").unwrap_err(), "missing is required");
        assert_eq!(ctx.required_str("blank").unwrap_err(), "blank is required");
        assert_eq!(ctx.required_str("number").unwrap_err(), "number is required");
        assert_eq!(ctx.required_str("email").unwrap(), "a@b.com");
    }

    #[test]
    fn test_context_ids_are_unique_per_execution() {
        let a = JobExecutionContext::new("same", JobData::new());
        let b = JobExecutionContext::new("same", JobData::new());
        assert_ne!(a.job_id, b.job_id);
        assert!(a.user_id.is_none());
        assert!(a.tenant_id.is_none());
    }

    #[test]
    fn test_attribution_is_copied_into_context() {
        let ctx = JobExecutionContext::new("export", JobData::new())
            .with_attribution(Attribution::user("u-1").with_tenant("t-9"));
        assert_eq!(ctx.user_id.as_deref(), Some("u-1"));
        assert_eq!(ctx.tenant_id.as_deref(), Some("t-9"));
    }

    #[test]
    fn test_success_result_has_no_error_fields() {
        let result = JobResult::success("done").with_duration_ms(12).with_retry_count(2);
        assert!(result.is_success());
        assert!(result.error_message().is_none());
        assert!(result.stack_trace().is_none());
        assert!(result.failure_kind().is_none());
        assert_eq!(result.duration_ms(), 12);
        assert_eq!(result.retry_count(), 2);
    }

    #[test]
    fn test_from_error_renders_source_chain() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk gone");
        let err = crate::jobs::JobError::execution_with("export failed", io);
        let result = JobResult::from_error("Export failed", &err);

        assert!(!result.is_success());
        assert_eq!(result.error_message(), Some("Job execution failed: export failed"));
        let trace = result.stack_trace().unwrap();
        assert!(trace.contains("Caused by:"));
        assert!(trace.contains("disk gone"));
        assert!(result.is_retryable());
    }

    #[test]
    fn test_validation_failure_is_not_retryable() {
        let result = JobResult::validation_failure("taskId is required");
        assert!(!result.is_success());
        assert_eq!(result.failure_kind(), Some(FailureKind::Validation));
        assert!(!result.is_retryable());
    }

    #[test]
    fn test_job_value_from_json() {
        let value = JobValue::from(serde_json::json!({
            "taskId": "42",
            "count": 3,
            "ratio": 0.5,
            "tags": ["a", "b"],
            "missing": null
        }));
        let map = value.as_map().unwrap();
        assert_eq!(map["taskId"], JobValue::from("42"));
        assert_eq!(map["count"].as_i64(), Some(3));
        assert_eq!(map["ratio"], JobValue::Float(0.5));
        assert_eq!(map["missing"], JobValue::Null);
        assert!(matches!(map["tags"], JobValue::List(ref items) if items.len() == 2));
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(JobStatus::Succeeded.is_terminal());
        assert!(JobStatus::Failed.is_terminal());
        assert!(JobStatus::Deleted.is_terminal());
        assert!(!JobStatus::Awaiting.is_terminal());
        assert!(!JobStatus::Enqueued.is_terminal());
    }
}
