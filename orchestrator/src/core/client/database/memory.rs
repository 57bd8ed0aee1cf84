use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{SubsecRound, Utc};
use tokio::sync::RwLock;
use tracing::{debug, warn};
use uuid::Uuid;

use super::error::DatabaseError;
use crate::core::client::database::DatabaseClient;
use crate::types::jobs::job_item::JobItem;
use crate::types::jobs::job_updates::JobItemUpdates;
use crate::types::jobs::types::{JobStatus, JobType};

/// Process-local job store. Jobs live as long as the process does.
#[derive(Default)]
pub struct InMemoryDatabase {
    jobs: RwLock<HashMap<Uuid, JobItem>>,
    model_versions: RwLock<HashMap<String, u32>>,
}

impl InMemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DatabaseClient for InMemoryDatabase {
    async fn disconnect(&self) -> Result<(), DatabaseError> {
        Ok(())
    }

    async fn create_job(&self, job: JobItem) -> Result<JobItem, DatabaseError> {
        job.check_consistency().map_err(DatabaseError::InvalidUpdate)?;
        let mut jobs = self.jobs.write().await;
        if jobs.contains_key(&job.id) {
            return Err(DatabaseError::ItemAlreadyExists(format!("Job already exists with id {}", job.id)));
        }
        jobs.insert(job.id, job.clone());
        debug!(job_id = %job.id, "Job created in memory");
        Ok(job)
    }

    async fn get_job_by_id(&self, id: Uuid) -> Result<Option<JobItem>, DatabaseError> {
        Ok(self.jobs.read().await.get(&id).cloned())
    }

    async fn update_job(&self, current_job: &JobItem, update: JobItemUpdates) -> Result<JobItem, DatabaseError> {
        if update.is_empty() {
            return Err(DatabaseError::NoUpdateFound("No field to be updated, likely a false call".to_string()));
        }

        let mut jobs = self.jobs.write().await;
        let stored = jobs
            .get_mut(&current_job.id)
            .filter(|stored| stored.status == current_job.status && stored.version == current_job.version);
        let Some(stored) = stored else {
            warn!(version = %current_job.version, "Failed to update job. Job version is likely outdated");
            return Err(DatabaseError::UpdateFailed(format!("Failed to update job. Identifier - {}, ", current_job.id)));
        };

        let mut next = update.apply_to(stored);
        next.check_consistency().map_err(DatabaseError::InvalidUpdate)?;
        next.version = stored.version + 1;
        next.updated_at = Utc::now().trunc_subsecs(3).max(stored.updated_at);
        *stored = next.clone();
        debug!(job_id = %next.id, status = %next.status, "Job updated successfully");
        Ok(next)
    }

    async fn get_jobs_by_types_and_statuses(
        &self,
        job_type: Vec<JobType>,
        status: Vec<JobStatus>,
        limit: Option<i64>,
    ) -> Result<Vec<JobItem>, DatabaseError> {
        let jobs = self.jobs.read().await;
        let mut matching: Vec<JobItem> = jobs
            .values()
            .filter(|job| job_type.is_empty() || job_type.contains(&job.job_type))
            .filter(|job| status.is_empty() || status.contains(&job.status))
            .cloned()
            .collect();
        matching.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        if let Some(limit) = limit {
            matching.truncate(usize::try_from(limit.max(0)).unwrap_or(usize::MAX));
        }
        Ok(matching)
    }

    async fn count_jobs_by_status(&self, status: JobStatus) -> Result<u64, DatabaseError> {
        Ok(self.jobs.read().await.values().filter(|job| job.status == status).count() as u64)
    }

    async fn next_model_version(&self, model_id: &str) -> Result<u32, DatabaseError> {
        let mut versions = self.model_versions.write().await;
        let version = versions.entry(model_id.to_string()).or_insert(0);
        *version = version
            .checked_add(1)
            .ok_or_else(|| DatabaseError::InvalidVersionCounter(format!("{} has no versions left", model_id)))?;
        debug!(model_id, version = *version, "Allocated model version");
        Ok(*version)
    }
}
