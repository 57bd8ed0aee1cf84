pub mod constant;
pub mod error;
pub mod memory;
pub mod mongodb;

use async_trait::async_trait;
pub use error::DatabaseError;

use crate::types::jobs::job_item::JobItem;
use crate::types::jobs::job_updates::JobItemUpdates;
use crate::types::jobs::types::{JobStatus, JobType};

/// Trait defining database operations
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DatabaseClient: Send + Sync {
    /// disconnect - Disconnect from the database
    async fn disconnect(&self) -> Result<(), DatabaseError>;

    /// create_job - Create a new job in the database
    async fn create_job(&self, job: JobItem) -> Result<JobItem, DatabaseError>;
    /// get_job_by_id - Get a job by its ID
    async fn get_job_by_id(&self, id: uuid::Uuid) -> Result<Option<JobItem>, DatabaseError>;
    /// update_job - Atomically apply `update` if the stored job still has the id, status and
    /// version of `current_job`. Fails with [`DatabaseError::UpdateFailed`] otherwise.
    async fn update_job(&self, current_job: &JobItem, update: JobItemUpdates) -> Result<JobItem, DatabaseError>;
    /// get_jobs_by_types_and_statuses - Get the jobs matching any of the types and statuses,
    /// oldest first. An empty list matches everything for that field.
    async fn get_jobs_by_types_and_statuses(
        &self,
        job_type: Vec<JobType>,
        status: Vec<JobStatus>,
        limit: Option<i64>,
    ) -> Result<Vec<JobItem>, DatabaseError>;
    /// count_jobs_by_status - Number of jobs currently in `status`
    async fn count_jobs_by_status(&self, status: JobStatus) -> Result<u64, DatabaseError>;

    /// next_model_version - Atomically allocate the next version of `model_id`, starting at 1.
    /// A version is never handed out twice, even if the run that took it fails.
    async fn next_model_version(&self, model_id: &str) -> Result<u32, DatabaseError>;
}
