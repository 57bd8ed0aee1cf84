use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::jobs::job_item::JobItem;
use crate::types::jobs::types::{JobStatus, JobType};

/// Read-only projection of a job handed to callers outside the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobView {
    pub id: Uuid,
    pub kind: JobType,
    pub status: JobStatus,
    pub attempt: u32,
    pub remote_handle: Option<String>,
    pub result_location: Option<String>,
    pub model_version: Option<u32>,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<JobItem> for JobView {
    fn from(job: JobItem) -> Self {
        Self {
            id: job.id,
            kind: job.job_type,
            status: job.status,
            attempt: job.attempt,
            remote_handle: job.remote_handle,
            result_location: job.result_location,
            model_version: job.metadata.model_version,
            error: job.error,
            created_at: job.created_at,
            updated_at: job.updated_at,
        }
    }
}
