pub mod local_training;
pub mod remote_training;
pub mod review;

use std::sync::Arc;

use async_trait::async_trait;
use orchestrator_training_client_interface::TrainingSpec;
use serde::Serialize;

use crate::core::config::Config;
use crate::error::job::JobError;
use crate::types::jobs::context::JobContext;
use crate::types::jobs::job_item::JobItem;
use crate::types::jobs::payloads::{model_id, TrainingPayload};

/// What a handler achieved for one execution attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    /// Work finished on this host, the artifact lives at `result_location`
    Completed { result_location: String, model_version: Option<u32> },
    /// Work was handed to the remote platform, the reconciler follows `remote_handle`
    Submitted { remote_handle: String, model_version: Option<u32> },
}

impl JobOutcome {
    pub fn model_version(&self) -> Option<u32> {
        match self {
            JobOutcome::Completed { model_version, .. } | JobOutcome::Submitted { model_version, .. } => *model_version,
        }
    }
}

/// One implementation per job kind. Handlers only execute work; every state transition is
/// written by the caller from the returned outcome or error.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait JobHandlerTrait: Send + Sync {
    async fn process_job(
        &self,
        config: Arc<Config>,
        job: &JobItem,
        context: &JobContext,
    ) -> Result<JobOutcome, JobError>;
}

/// Builds the `TrainingSpec` of a training job. A job keeps the version it was given on an earlier run,
/// otherwise the next version of its model is allocated.
pub(crate) async fn versioned_training_spec(config: &Config, job: &JobItem) -> Result<TrainingSpec, JobError> {
    let payload = TrainingPayload::parse(&job.payload)?;
    let environment = &config.service_config().environment;
    let version = match job.metadata.model_version {
        Some(version) => version,
        None => config.database().next_model_version(&model_id(environment, &payload.label)).await?,
    };
    payload.into_spec(environment, version)
}

/// Document handed to a local runner
#[derive(Debug, Serialize)]
pub(crate) struct RunnerInput<'a, T: Serialize> {
    pub job_id: uuid::Uuid,
    pub attempt: u32,
    pub input: &'a T,
}

impl<'a, T: Serialize> RunnerInput<'a, T> {
    pub fn new(job: &JobItem, input: &'a T) -> Self {
        Self { job_id: job.id, attempt: job.attempt, input }
    }

    pub fn to_value(&self) -> Result<serde_json::Value, JobError> {
        Ok(serde_json::to_value(self)?)
    }
}
