use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};

/// Kind of work a job carries. Each kind is bound to exactly one queue and one handler.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum JobType {
    /// Annotation review work (building annotation requests for a task)
    Review,
    /// Model training executed on the worker's own host
    LocalTrain,
    /// Model training dispatched to the remote training platform
    RemoteTrain,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum JobStatus {
    /// Accepted and waiting on its queue
    Pending,
    /// Held by a worker that is executing it
    Running,
    /// Dispatched to the remote platform, completion is observed by the reconciler
    Submitted,
    /// Finished with a result location
    Succeeded,
    /// Finished without a result, the error is recorded on the job
    Failed,
    /// Stopped on request
    Cancelled,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Succeeded | JobStatus::Failed | JobStatus::Cancelled)
    }
}
