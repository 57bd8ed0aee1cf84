use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::core::config::Config;
use crate::error::job::JobError;
use crate::types::jobs::context::JobContext;
use crate::types::jobs::job_item::JobItem;
use crate::types::jobs::types::JobType;
use crate::worker::event_handler::jobs::{versioned_training_spec, JobHandlerTrait, JobOutcome, RunnerInput};

pub struct LocalTrainingJobHandler;

#[async_trait]
impl JobHandlerTrait for LocalTrainingJobHandler {
    #[tracing::instrument(fields(category = "local_training", job_id = %job.id), skip(self, config, job, context), err)]
    async fn process_job(
        &self,
        config: Arc<Config>,
        job: &JobItem,
        context: &JobContext,
    ) -> Result<JobOutcome, JobError> {
        let spec = versioned_training_spec(&config, job).await?;
        info!(model_id = %spec.model_id, version = spec.version, label = %spec.label, "Training model locally");

        let input = RunnerInput::new(job, &spec).to_value()?;
        let result_location = config.local_runner().run(JobType::LocalTrain, input, context).await?;

        info!(model_id = %spec.model_id, result_location = %result_location, "Local training finished");
        Ok(JobOutcome::Completed { result_location, model_version: Some(spec.version) })
    }
}
