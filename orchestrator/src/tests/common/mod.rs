use std::sync::Arc;
use std::time::Duration;

use rstest::fixture;
use serde_json::{json, Value};
use tempfile::TempDir;
use uuid::Uuid;

use crate::core::config::Config;
use crate::types::jobs::context::JobContext;
use crate::types::jobs::job_item::JobItem;
use crate::types::jobs::types::{JobStatus, JobType};

#[fixture]
pub fn review_payload() -> Value {
    json!({"task_id": "42", "entity_type": "company"})
}

#[fixture]
pub fn training_payload() -> Value {
    json!({
        "label": "b2b",
        "entity_type": "company",
        "data_reference": "gs://exports/b2b.jsonl",
        "train_config": {"num_train_epochs": 2}
    })
}

pub fn payload_for(job_type: JobType) -> Value {
    match job_type {
        JobType::Review => review_payload(),
        JobType::LocalTrain | JobType::RemoteTrain => training_payload(),
    }
}

/// A scratch directory and the context of a worker owning it. Keep the directory alive as long
/// as the context is used.
#[fixture]
pub fn job_context() -> (TempDir, JobContext) {
    let dir = tempfile::tempdir().expect("Failed to create scratch directory");
    let context = JobContext::new("test-worker-0", dir.path());
    (dir, context)
}

/// Builds a job in `status` whose fields agree with that status.
pub fn build_job_item(job_type: JobType, status: JobStatus, attempt: u32) -> JobItem {
    let mut job = JobItem::create(job_type, payload_for(job_type));
    job.status = status;
    job.attempt = attempt;
    match status {
        JobStatus::Submitted => job.remote_handle = Some(format!("run-{}", job.id)),
        JobStatus::Succeeded => job.result_location = Some(format!("gs://models/{}", job.id)),
        JobStatus::Failed => job.error = Some("boom".to_string()),
        _ => {}
    }
    job
}

/// Stores a job built by [`build_job_item`].
pub async fn create_job_in_db(config: &Arc<Config>, job_type: JobType, status: JobStatus, attempt: u32) -> JobItem {
    config.database().create_job(build_job_item(job_type, status, attempt)).await.expect("Failed to create job")
}

pub async fn get_job(config: &Arc<Config>, id: Uuid) -> JobItem {
    config.database().get_job_by_id(id).await.expect("Failed to read job").expect("Job should exist")
}

/// Polls the store until the job reaches `status`. Panics after `timeout`.
pub async fn wait_for_status(config: &Arc<Config>, id: Uuid, status: JobStatus, timeout: Duration) -> JobItem {
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        let job = get_job(config, id).await;
        if job.status == status {
            return job;
        }
        if tokio::time::Instant::now() >= deadline {
            panic!("Job {} is {} after {:?}, expected {}", id, job.status, timeout, status);
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
