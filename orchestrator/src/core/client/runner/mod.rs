pub mod command;

use async_trait::async_trait;
use thiserror::Error;

use crate::error::job::JobError;
use crate::types::jobs::context::JobContext;
use crate::types::jobs::types::JobType;

#[derive(Error, Debug)]
pub enum RunnerError {
    /// Worth another attempt: the runner asked for a retry or timed out
    #[error("Local run failed transiently: {0}")]
    Transient(String),

    #[error("Local run failed: {0}")]
    Failed(String),

    #[error("No local command is configured for {0} jobs")]
    NotConfigured(JobType),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<RunnerError> for JobError {
    fn from(err: RunnerError) -> Self {
        match err {
            RunnerError::Transient(message) => JobError::TransientExecutionError(message),
            RunnerError::Io(e) => JobError::TransientExecutionError(e.to_string()),
            other => JobError::ExecutionError(other.to_string()),
        }
    }
}

/// Executes review and local training work on this host.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LocalRunner: Send + Sync {
    /// Runs the job with the given validated input and returns the location of what it produced.
    async fn run(
        &self,
        job_type: JobType,
        input: serde_json::Value,
        context: &JobContext,
    ) -> Result<String, RunnerError>;
}
