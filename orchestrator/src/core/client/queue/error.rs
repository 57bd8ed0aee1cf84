use thiserror::Error;

use crate::types::queue::QueueType;

#[derive(Error, Debug)]
pub enum QueueError {
    #[error("Queue {0} is closed")]
    QueueClosed(QueueType),

    #[error("Queue error: {0}")]
    ErrorFromQueueError(String),
}
