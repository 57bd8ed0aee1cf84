use std::collections::HashMap;
use std::sync::Arc;

use strum::IntoEnumIterator;

use crate::types::jobs::types::JobType;
use crate::worker::event_handler::jobs::local_training::LocalTrainingJobHandler;
use crate::worker::event_handler::jobs::remote_training::RemoteTrainingJobHandler;
use crate::worker::event_handler::jobs::review::ReviewJobHandler;
use crate::worker::event_handler::jobs::JobHandlerTrait;

/// To get the job handler bound to a job type
pub fn get_job_handler(job_type: &JobType) -> Arc<dyn JobHandlerTrait> {
    match job_type {
        JobType::Review => Arc::new(ReviewJobHandler),
        JobType::LocalTrain => Arc::new(LocalTrainingJobHandler),
        JobType::RemoteTrain => Arc::new(RemoteTrainingJobHandler),
    }
}

/// One handler per job type, the registry every config starts from
pub fn default_job_handlers() -> HashMap<JobType, Arc<dyn JobHandlerTrait>> {
    JobType::iter().map(|job_type| (job_type, get_job_handler(&job_type))).collect()
}
