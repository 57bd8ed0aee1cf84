use chrono::{DateTime, SubsecRound, Utc};
use mongodb::bson::serde_helpers::{chrono_datetime_as_bson_datetime, uuid_1_as_binary};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::jobs::metadata::CommonMetadata;
use crate::types::jobs::types::{JobStatus, JobType};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct JobItem {
    /// an uuid to identify a job
    #[serde(with = "uuid_1_as_binary")]
    pub id: Uuid,
    /// the kind of job, decides the queue and the handler
    pub job_type: JobType,
    /// the status of the job
    pub status: JobStatus,
    /// number of execution attempts started so far
    pub attempt: u32,
    /// handle returned by the remote platform, only set while the job is submitted
    pub remote_handle: Option<String>,
    /// location of the produced artifact, only set once the job succeeded
    pub result_location: Option<String>,
    /// last failure reason
    pub error: Option<String>,
    /// request body as submitted, interpreted by the handler of `job_type`
    pub payload: serde_json::Value,
    pub metadata: CommonMetadata,
    /// helps to keep track of the version of the item for optimistic locking
    pub version: u64,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

impl JobItem {
    /// Builds a fresh `pending` job. Timestamps are truncated to milliseconds so they survive a
    /// round trip through the database unchanged.
    pub fn create(job_type: JobType, payload: serde_json::Value) -> Self {
        let now = Utc::now().trunc_subsecs(3);
        Self {
            id: Uuid::new_v4(),
            job_type,
            status: JobStatus::Pending,
            attempt: 0,
            remote_handle: None,
            result_location: None,
            error: None,
            payload,
            metadata: CommonMetadata::default(),
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Checks the field/status pairings every stored job must satisfy.
    pub fn check_consistency(&self) -> Result<(), String> {
        let submitted = self.status == JobStatus::Submitted;
        if self.remote_handle.is_some() != submitted {
            return Err(format!(
                "remote_handle must be present iff status is submitted (status: {}, remote_handle: {:?})",
                self.status, self.remote_handle
            ));
        }
        let succeeded = self.status == JobStatus::Succeeded;
        if self.result_location.is_some() != succeeded {
            return Err(format!(
                "result_location must be present iff status is succeeded (status: {}, result_location: {:?})",
                self.status, self.result_location
            ));
        }
        Ok(())
    }
}
