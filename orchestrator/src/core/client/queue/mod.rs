pub mod error;
pub mod memory;

use std::time::Duration;

use async_trait::async_trait;
pub use error::QueueError;
use uuid::Uuid;

use crate::types::queue::{JobQueueMessage, QueueType};

/// Trait defining queue operations
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait QueueClient: Send + Sync {
    /// Puts a message on `queue`. With a delay, the message only becomes visible once it elapsed.
    async fn send_message(
        &self,
        queue: QueueType,
        message: JobQueueMessage,
        delay: Option<Duration>,
    ) -> Result<(), QueueError>;

    /// Waits for the next visible message. Returns `None` once the queue is closed.
    async fn consume_message(&self, queue: QueueType) -> Result<Option<JobQueueMessage>, QueueError>;

    /// Drops every message for job `id` from `queue`, visible or delayed.
    /// Returns whether anything was removed.
    async fn remove_job(&self, queue: QueueType, id: Uuid) -> Result<bool, QueueError>;

    /// Number of visible messages waiting on `queue`
    async fn queue_depth(&self, queue: QueueType) -> Result<usize, QueueError>;

    /// Stops delivery. Pending and future `consume_message` calls return `None`.
    async fn close(&self);

    /// Perform a health check on the queue service
    async fn health_check(&self) -> Result<(), QueueError>;
}
