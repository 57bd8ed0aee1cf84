use orchestrator_training_client_interface::TrainingClientError;
use thiserror::Error;
use uuid::Uuid;

use crate::core::client::database::DatabaseError;
use crate::core::client::lock::error::LockError;
use crate::core::client::queue::QueueError;
use crate::error::other::OtherError;
use crate::types::jobs::types::JobStatus;

/// Whether a failure is worth another attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Network hiccups, throttling, temporary resource contention
    Transient,
    /// Bad input or a rejected request, retrying cannot help
    Permanent,
}

/// Error types for job-related operations in the orchestrator
#[derive(Error, Debug)]
pub enum JobError {
    /// The requested kind is not one of the known job kinds, no job was created
    #[error("Invalid job kind: {0}")]
    InvalidKind(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Transient execution error: {0}")]
    TransientExecutionError(String),

    #[error("Execution error: {0}")]
    ExecutionError(String),

    #[error("Training client error: {0}")]
    TrainingClientError(#[from] TrainingClientError),

    #[error("No training client is configured")]
    TrainingClientNotConfigured,

    /// The handler panicked while executing the job
    #[error("Job handler panicked: {0}")]
    Panicked(String),

    /// Indicates the requested job could not be found
    #[error("Failed to find job with id {id:?}")]
    JobNotFound { id: Uuid },

    #[error("Job {id} is {status} and can no longer be cancelled")]
    NotCancellable { id: Uuid, status: JobStatus },

    #[error("Failed to serialize data: {0}")]
    FailedToSerializeData(#[from] serde_json::Error),

    #[error("Queue error: {0}")]
    QueueError(#[from] QueueError),

    #[error("Database error: {0}")]
    DatabaseError(#[from] DatabaseError),

    /// Indicates an error occurred while taking the processing lock
    #[error("Lock error: {0}")]
    LockError(#[from] LockError),

    /// Wraps general errors that don't fit other categories
    #[error("Other error: {0}")]
    Other(#[from] OtherError),
}

impl JobError {
    /// Classification used by the retry policy.
    ///
    /// Only errors raised while executing a job are meaningful here. Infrastructure errors
    /// (database, queue, lock) count as transient since the job itself was never at fault.
    pub fn class(&self) -> ErrorClass {
        match self {
            JobError::TransientExecutionError(_) => ErrorClass::Transient,
            JobError::TrainingClientError(e) if e.is_transient() => ErrorClass::Transient,
            JobError::QueueError(_) | JobError::DatabaseError(_) | JobError::LockError(_) => ErrorClass::Transient,
            _ => ErrorClass::Permanent,
        }
    }
}
