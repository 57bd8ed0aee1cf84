use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter};
use uuid::Uuid;

use crate::types::jobs::types::JobType;

#[derive(Display, Debug, Clone, Copy, PartialEq, Eq, EnumIter, Hash)]
pub enum QueueType {
    #[strum(serialize = "review_jobs")]
    ReviewJobs,
    #[strum(serialize = "local_train_jobs")]
    LocalTrainJobs,
    #[strum(serialize = "remote_train_jobs")]
    RemoteTrainJobs,
}

pub trait QueueNameForJobType {
    fn queue_name(&self) -> QueueType;
}

impl QueueNameForJobType for JobType {
    fn queue_name(&self) -> QueueType {
        match self {
            JobType::Review => QueueType::ReviewJobs,
            JobType::LocalTrain => QueueType::LocalTrainJobs,
            JobType::RemoteTrain => QueueType::RemoteTrainJobs,
        }
    }
}

/// Reference to a job travelling through a queue. The job record itself stays in the database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobQueueMessage {
    pub id: Uuid,
    /// How many times a worker put this message back after a lock collision
    #[serde(default)]
    pub requeue_count: u32,
}

impl JobQueueMessage {
    pub fn new(id: Uuid) -> Self {
        Self { id, requeue_count: 0 }
    }
}
