use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::core::config::Config;
use crate::error::job::JobError;
use crate::types::jobs::context::JobContext;
use crate::types::jobs::job_item::JobItem;
use crate::worker::event_handler::jobs::{versioned_training_spec, JobHandlerTrait, JobOutcome};

/// Submits the training run and returns right away, the reconciler tracks it from there.
pub struct RemoteTrainingJobHandler;

#[async_trait]
impl JobHandlerTrait for RemoteTrainingJobHandler {
    #[tracing::instrument(fields(category = "remote_training", job_id = %job.id), skip(self, config, job, _context), err)]
    async fn process_job(
        &self,
        config: Arc<Config>,
        job: &JobItem,
        _context: &JobContext,
    ) -> Result<JobOutcome, JobError> {
        let training_client = config.training_client().ok_or(JobError::TrainingClientNotConfigured)?;
        let spec = versioned_training_spec(&config, job).await?;
        let version = spec.version;

        let remote_handle = training_client.submit(spec.clone()).await.inspect_err(|e| {
            warn!(model_id = %spec.model_id, error = %e, transient = e.is_transient(), "Training submission failed");
        })?;

        info!(model_id = %spec.model_id, version, remote_handle = %remote_handle, "Training run submitted");
        Ok(JobOutcome::Submitted { remote_handle, model_version: Some(version) })
    }
}
