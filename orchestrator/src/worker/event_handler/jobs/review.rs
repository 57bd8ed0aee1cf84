use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::core::config::Config;
use crate::error::job::JobError;
use crate::types::jobs::context::JobContext;
use crate::types::jobs::job_item::JobItem;
use crate::types::jobs::payloads::ReviewPayload;
use crate::types::jobs::types::JobType;
use crate::worker::event_handler::jobs::{JobHandlerTrait, JobOutcome, RunnerInput};

/// Builds the annotation requests of a task on this host.
pub struct ReviewJobHandler;

#[async_trait]
impl JobHandlerTrait for ReviewJobHandler {
    #[tracing::instrument(fields(category = "review", job_id = %job.id), skip(self, config, job, context), err)]
    async fn process_job(
        &self,
        config: Arc<Config>,
        job: &JobItem,
        context: &JobContext,
    ) -> Result<JobOutcome, JobError> {
        let review = ReviewPayload::parse(&job.payload)?;
        debug!(
            task_id = %review.task_id,
            entity_type = %review.entity_type,
            max_per_annotator = review.max_per_annotator,
            max_per_dp = review.max_per_dp,
            "Running review job"
        );

        let input = RunnerInput::new(job, &review).to_value()?;
        let result_location = config.local_runner().run(JobType::Review, input, context).await?;

        info!(task_id = %review.task_id, result_location = %result_location, "Review job finished");
        Ok(JobOutcome::Completed { result_location, model_version: None })
    }
}
