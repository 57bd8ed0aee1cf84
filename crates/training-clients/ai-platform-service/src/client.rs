use reqwest::header::{HeaderValue, ACCEPT};
use reqwest::{Client, Response, StatusCode};
use tracing::debug;
use url::Url;

use crate::constants::{AI_PLATFORM_API_VERSION, AI_PLATFORM_REQUEST_TIMEOUT};
use crate::error::AiPlatformError;
use crate::types::{CreateTrainingJobRequest, CreateTrainingJobResponse, TrainingJobResource};
use crate::AiPlatformValidatedArgs;

/// Thin async wrapper over the AI Platform training jobs REST API
pub struct AiPlatformClient {
    client: Client,
    base_url: Url,
    project: String,
    api_key: String,
}

impl AiPlatformClient {
    pub fn new_with_args(args: &AiPlatformValidatedArgs) -> Result<Self, AiPlatformError> {
        let client = Client::builder()
            .timeout(args.request_timeout.unwrap_or(AI_PLATFORM_REQUEST_TIMEOUT))
            .build()
            .map_err(|e| AiPlatformError::ClientBuild(e.to_string()))?;

        Ok(Self {
            client,
            base_url: args.base_url.clone(),
            project: args.project.clone(),
            api_key: args.api_key.clone(),
        })
    }

    /// Builds `{base}/v1/projects/{project}/{segments..}`
    fn endpoint(&self, operation: &str, segments: &[&str]) -> Result<Url, AiPlatformError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| AiPlatformError::url_error(operation, format!("{} cannot be a base", self.base_url)))?
            .pop_if_empty()
            .extend([AI_PLATFORM_API_VERSION, "projects", self.project.as_str()])
            .extend(segments);
        Ok(url)
    }

    /// Creates a training job and returns the id the platform assigned to it.
    pub async fn create_job(
        &self,
        request: &CreateTrainingJobRequest,
    ) -> Result<CreateTrainingJobResponse, AiPlatformError> {
        let url = self.endpoint("create_job", &["jobs"])?;
        debug!(url = %url, display_name = %request.display_name, "Creating training job");

        let response = self
            .client
            .post(url)
            .bearer_auth(&self.api_key)
            .header(ACCEPT, HeaderValue::from_static("application/json"))
            .json(request)
            .send()
            .await
            .map_err(|e| AiPlatformError::from_reqwest_error("create_job", e))?;

        let response = Self::ensure_success("create_job", response).await?;
        response.json().await.map_err(|e| AiPlatformError::from_reqwest_error("create_job", e))
    }

    /// Fetches a training job. Returns `None` when the platform does not know the id.
    pub async fn get_job(&self, job_id: &str) -> Result<Option<TrainingJobResource>, AiPlatformError> {
        let url = self.endpoint("get_job", &["jobs", job_id])?;

        let response = self
            .client
            .get(url)
            .bearer_auth(&self.api_key)
            .header(ACCEPT, HeaderValue::from_static("application/json"))
            .send()
            .await
            .map_err(|e| AiPlatformError::from_reqwest_error("get_job", e))?;

        if response.status() == StatusCode::NOT_FOUND {
            debug!(job_id = %job_id, "Training job not found on platform");
            return Ok(None);
        }

        let response = Self::ensure_success("get_job", response).await?;
        response.json().await.map(Some).map_err(|e| AiPlatformError::from_reqwest_error("get_job", e))
    }

    pub async fn cancel_job(&self, job_id: &str) -> Result<(), AiPlatformError> {
        let url = self.endpoint("cancel_job", &["jobs", &format!("{}:cancel", job_id)])?;

        let response = self
            .client
            .post(url)
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| AiPlatformError::from_reqwest_error("cancel_job", e))?;

        Self::ensure_success("cancel_job", response).await.map(|_| ())
    }

    async fn ensure_success(operation: &str, response: Response) -> Result<Response, AiPlatformError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(AiPlatformError::api_error(operation, status, body))
    }
}
