use async_trait::async_trait;
use mockall::automock;
use serde::{Deserialize, Serialize};

/// Training client provides an abstraction over remote training platforms that do the following:
/// - Accept a training specification (data reference, model parameters, compute profile)
/// - Run the training asynchronously on their own infrastructure
/// - Expose the state of the run and, once it succeeded, the location of the trained model
///
/// Implementations never touch job records. The orchestrator owns all state transitions and only
/// uses the handle returned by [`TrainingClient::submit`] to talk to the platform later on.
#[automock]
#[async_trait]
pub trait TrainingClient: Send + Sync {
    /// Dispatches a training run and returns the opaque remote handle.
    async fn submit(&self, spec: TrainingSpec) -> Result<String, TrainingClientError>;
    /// Fetches the current state of a run.
    async fn poll(&self, handle: &str) -> Result<RemoteStatus, TrainingClientError>;
    /// Returns the artifact location of a succeeded run.
    async fn fetch_result(&self, handle: &str) -> Result<String, TrainingClientError>;
    /// Asks the platform to stop a run. Best effort, the platform may keep computing.
    async fn cancel(&self, handle: &str) -> Result<(), TrainingClientError>;
}

/// State of a remote run as reported by the platform
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteStatus {
    Running,
    Succeeded,
    Failed(String),
    /// The platform does not know the handle (yet, or anymore)
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainConfig {
    #[serde(default = "default_epochs")]
    pub num_train_epochs: u32,
    #[serde(default = "default_sliding_window")]
    pub sliding_window: bool,
    #[serde(default = "default_max_seq_length")]
    pub max_seq_length: u32,
    #[serde(default = "default_train_batch_size")]
    pub train_batch_size: u32,
    #[serde(default = "default_test_size")]
    pub test_size: f64,
    #[serde(default = "default_random_state")]
    pub random_state: u64,
}

fn default_epochs() -> u32 {
    5
}

fn default_sliding_window() -> bool {
    true
}

fn default_max_seq_length() -> u32 {
    512
}

fn default_train_batch_size() -> u32 {
    8
}

fn default_test_size() -> f64 {
    0.3
}

fn default_random_state() -> u64 {
    42
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            num_train_epochs: default_epochs(),
            sliding_window: default_sliding_window(),
            max_seq_length: default_max_seq_length(),
            train_batch_size: default_train_batch_size(),
            test_size: default_test_size(),
            random_state: default_random_state(),
        }
    }
}

/// Hardware requested from the platform
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComputeProfile {
    pub machine_type: String,
    #[serde(default)]
    pub accelerator: Option<String>,
    #[serde(default)]
    pub accelerator_count: u32,
    #[serde(default)]
    pub region: Option<String>,
}

impl Default for ComputeProfile {
    fn default() -> Self {
        Self { machine_type: "n1-standard-4".to_string(), accelerator: None, accelerator_count: 0, region: None }
    }
}

/// Everything a platform needs to train one model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingSpec {
    /// Stable identifier of the model being trained, shared by all its versions
    pub model_id: String,
    /// Version this run produces for `model_id`, starting at 1
    pub version: u32,
    pub label: String,
    pub entity_type: String,
    /// Location of the exported training data
    pub data_reference: String,
    pub train_config: TrainConfig,
    pub compute_profile: ComputeProfile,
}

impl TrainingSpec {
    /// Checks the training run for values no platform would accept.
    pub fn validate(&self) -> Result<(), TrainingClientError> {
        if self.model_id.trim().is_empty() {
            return Err(TrainingClientError::InvalidSpec("model_id is empty".to_string()));
        }
        if self.version == 0 {
            return Err(TrainingClientError::InvalidSpec("version must start at 1".to_string()));
        }
        if self.label.trim().is_empty() {
            return Err(TrainingClientError::InvalidSpec("label is empty".to_string()));
        }
        if self.data_reference.trim().is_empty() {
            return Err(TrainingClientError::InvalidSpec("data_reference is empty".to_string()));
        }
        if self.compute_profile.machine_type.trim().is_empty() {
            return Err(TrainingClientError::InvalidSpec("compute_profile.machine_type is empty".to_string()));
        }
        if self.train_config.num_train_epochs == 0 || self.train_config.train_batch_size == 0 {
            return Err(TrainingClientError::InvalidSpec("epochs and batch size must be positive".to_string()));
        }
        if !(0.0..1.0).contains(&self.train_config.test_size) {
            return Err(TrainingClientError::InvalidSpec(format!(
                "test_size must be in [0, 1), got {}",
                self.train_config.test_size
            )));
        }
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TrainingClientError {
    #[error("Training spec is invalid: {0}")]
    InvalidSpec(String),
    #[error("Platform rejected the submission: {0}")]
    Rejected(String),
    #[error("Platform is throttling requests: {0}")]
    Throttled(String),
    #[error("Submission failed transiently: {0}")]
    TransientSubmission(String),
    #[error("Failed to poll remote job: {0}")]
    TransientPoll(String),
    #[error("Result for {0} is not ready")]
    ResultNotReady(String),
    #[error("Internal training client error: {0}")]
    Internal(#[source] Box<dyn std::error::Error + Send + Sync + 'static>),
}

impl TrainingClientError {
    /// Errors the caller may retry later without changing the request
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            TrainingClientError::Throttled(_)
                | TrainingClientError::TransientSubmission(_)
                | TrainingClientError::TransientPoll(_)
        )
    }
}
