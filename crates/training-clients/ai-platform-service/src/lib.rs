pub mod client;
pub mod constants;
pub mod error;
pub mod types;

use std::time::Duration;

use async_trait::async_trait;
use orchestrator_training_client_interface::{RemoteStatus, TrainingClient, TrainingClientError, TrainingSpec};
use reqwest::StatusCode;
use url::Url;

use crate::client::AiPlatformClient;
use crate::constants::AI_PLATFORM_DISPLAY_NAME_PREFIX;
use crate::error::AiPlatformError;
pub use crate::types::AiPlatformJobState;
use crate::types::{AcceleratorConfig, CreateTrainingJobRequest, TrainingInput};

#[derive(Debug, Clone)]
pub struct AiPlatformValidatedArgs {
    pub base_url: Url,
    pub project: String,
    pub api_key: String,
    pub request_timeout: Option<Duration>,
}

/// Runs training jobs on a managed AI Platform project.
pub struct AiPlatformTrainingService {
    pub ai_platform_client: AiPlatformClient,
}

impl AiPlatformTrainingService {
    pub fn new_with_args(args: &AiPlatformValidatedArgs) -> Result<Self, TrainingClientError> {
        let ai_platform_client = AiPlatformClient::new_with_args(args)?;
        Ok(Self { ai_platform_client })
    }

    fn build_request(spec: &TrainingSpec) -> CreateTrainingJobRequest {
        let profile = &spec.compute_profile;
        CreateTrainingJobRequest {
            display_name: format!("{}-{}-v{}", AI_PLATFORM_DISPLAY_NAME_PREFIX, spec.label, spec.version),
            training_input: TrainingInput {
                model_id: spec.model_id.clone(),
                model_version: spec.version,
                label: spec.label.clone(),
                entity_type: spec.entity_type.clone(),
                data_reference: spec.data_reference.clone(),
                hyperparameters: spec.train_config.clone(),
                machine_type: profile.machine_type.clone(),
                accelerator: profile
                    .accelerator
                    .clone()
                    .map(|accelerator_type| AcceleratorConfig { accelerator_type, count: profile.accelerator_count.max(1) }),
                region: profile.region.clone(),
            },
        }
    }
}

#[async_trait]
impl TrainingClient for AiPlatformTrainingService {
    #[tracing::instrument(skip(self, spec), fields(model_id = %spec.model_id, version = spec.version, label = %spec.label))]
    async fn submit(&self, spec: TrainingSpec) -> Result<String, TrainingClientError> {
        spec.validate()?;
        let request = Self::build_request(&spec);

        let response = self.ai_platform_client.create_job(&request).await.map_err(submission_error)?;
        tracing::info!(
            log_type = "completed",
            category = "submit",
            remote_handle = %response.job_id,
            "Training job submitted to AI Platform."
        );
        Ok(response.job_id)
    }

    #[tracing::instrument(skip(self))]
    async fn poll(&self, handle: &str) -> Result<RemoteStatus, TrainingClientError> {
        let job = match self.ai_platform_client.get_job(handle).await {
            Ok(Some(job)) => job,
            Ok(None) => return Ok(RemoteStatus::Unknown),
            Err(e) => return Err(TrainingClientError::TransientPoll(e.to_string())),
        };

        tracing::debug!(state = %job.state, "Fetched training job state");
        Ok(match job.state {
            AiPlatformJobState::StateUnspecified
            | AiPlatformJobState::Queued
            | AiPlatformJobState::Preparing
            | AiPlatformJobState::Running
            | AiPlatformJobState::Cancelling => RemoteStatus::Running,
            AiPlatformJobState::Succeeded => RemoteStatus::Succeeded,
            AiPlatformJobState::Failed | AiPlatformJobState::Cancelled => RemoteStatus::Failed(
                job.error_message.unwrap_or_else(|| format!("training job ended in state {}", job.state)),
            ),
        })
    }

    #[tracing::instrument(skip(self))]
    async fn fetch_result(&self, handle: &str) -> Result<String, TrainingClientError> {
        let job = self
            .ai_platform_client
            .get_job(handle)
            .await
            .map_err(|e| TrainingClientError::TransientPoll(e.to_string()))?
            .ok_or_else(|| TrainingClientError::ResultNotReady(handle.to_string()))?;

        if job.state != AiPlatformJobState::Succeeded {
            return Err(TrainingClientError::ResultNotReady(handle.to_string()));
        }

        job.training_output
            .and_then(|output| output.model_dir)
            .filter(|dir| !dir.is_empty())
            .ok_or_else(|| TrainingClientError::ResultNotReady(handle.to_string()))
    }

    #[tracing::instrument(skip(self))]
    async fn cancel(&self, handle: &str) -> Result<(), TrainingClientError> {
        match self.ai_platform_client.cancel_job(handle).await {
            Ok(()) => Ok(()),
            // Already gone on the platform side, nothing left to stop
            Err(e) if e.status() == Some(StatusCode::NOT_FOUND) => Ok(()),
            Err(e) => Err(TrainingClientError::Internal(Box::new(e))),
        }
    }
}

fn submission_error(err: AiPlatformError) -> TrainingClientError {
    match err.status() {
        Some(StatusCode::TOO_MANY_REQUESTS) => TrainingClientError::Throttled(err.to_string()),
        Some(status) if status.is_client_error() => TrainingClientError::Rejected(err.to_string()),
        _ if err.is_retryable() => TrainingClientError::TransientSubmission(err.to_string()),
        _ => TrainingClientError::Internal(Box::new(err)),
    }
}

impl From<AiPlatformError> for TrainingClientError {
    fn from(value: AiPlatformError) -> Self {
        TrainingClientError::Internal(Box::new(value))
    }
}
