pub mod job;
pub mod other;

use thiserror::Error;

use crate::core::client::database::DatabaseError;
use crate::core::client::lock::error::LockError;
use crate::core::client::queue::QueueError;
use crate::error::job::JobError;

/// Result type for orchestrator operations
pub type OrchestratorResult<T> = Result<T, OrchestratorError>;

/// Error types for the orchestrator
#[derive(Error, Debug)]
pub enum OrchestratorError {
    #[error("Queue error: {0}")]
    QueueCoreError(#[from] QueueError),

    #[error("Database error: {0}")]
    DatabaseCoreError(#[from] DatabaseError),

    #[error("Lock error: {0}")]
    LockCoreError(#[from] LockError),

    #[error("Job error: {0}")]
    JobError(#[from] JobError),

    /// Run Command error
    #[error("Run Command Error: {0}")]
    RunCommandError(String),

    #[error("Orchestrator Error: {0}")]
    OrchestratorAnyHowError(#[from] anyhow::Error),

    /// Mongo error
    #[error("Mongo error: {0}")]
    MongoError(#[from] mongodb::error::Error),

    /// Training client error
    #[error("Training client error: {0}")]
    TrainingClientError(String),

    /// Server error
    #[error("Server error: {0}")]
    ServerError(String),

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}
