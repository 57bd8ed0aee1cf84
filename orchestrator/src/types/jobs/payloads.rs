use orchestrator_training_client_interface::{ComputeProfile, TrainConfig, TrainingSpec};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha224};

use crate::error::job::JobError;

pub const DEFAULT_MAX_PER_ANNOTATOR: u32 = 100;
pub const DEFAULT_MAX_PER_DP: u32 = 3;

fn default_max_per_annotator() -> u32 {
    DEFAULT_MAX_PER_ANNOTATOR
}

fn default_max_per_dp() -> u32 {
    DEFAULT_MAX_PER_DP
}

/// Request body of a `review` job: build the annotation requests of one task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewPayload {
    pub task_id: String,
    pub entity_type: String,
    /// Upper bound of data points handed to a single annotator
    #[serde(default = "default_max_per_annotator")]
    pub max_per_annotator: u32,
    /// Number of annotators that see the same data point
    #[serde(default = "default_max_per_dp")]
    pub max_per_dp: u32,
}

impl ReviewPayload {
    pub fn parse(payload: &serde_json::Value) -> Result<Self, JobError> {
        let review: Self = serde_json::from_value(payload.clone())
            .map_err(|e| JobError::ValidationError(format!("invalid review payload: {}", e)))?;
        if review.task_id.trim().is_empty() {
            return Err(JobError::ValidationError("task_id is empty".to_string()));
        }
        if review.entity_type.trim().is_empty() {
            return Err(JobError::ValidationError("entity_type is empty".to_string()));
        }
        if review.max_per_annotator == 0 || review.max_per_dp == 0 {
            return Err(JobError::ValidationError("max_per_annotator and max_per_dp must be positive".to_string()));
        }
        Ok(review)
    }
}

/// Request body of `local-train` and `remote-train` jobs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingPayload {
    pub label: String,
    pub entity_type: String,
    /// Location of the exported training data
    pub data_reference: String,
    #[serde(default)]
    pub train_config: TrainConfig,
    #[serde(default)]
    pub compute_profile: ComputeProfile,
}

impl TrainingPayload {
    pub fn parse(payload: &serde_json::Value) -> Result<Self, JobError> {
        serde_json::from_value(payload.clone())
            .map_err(|e| JobError::ValidationError(format!("invalid training payload: {}", e)))
    }

    /// Builds the platform-neutral spec of run `version` and validates it.
    pub fn into_spec(self, environment: &str, version: u32) -> Result<TrainingSpec, JobError> {
        let spec = TrainingSpec {
            model_id: model_id(environment, &self.label),
            version,
            label: self.label,
            entity_type: self.entity_type,
            data_reference: self.data_reference,
            train_config: self.train_config,
            compute_profile: self.compute_profile,
        };
        spec.validate().map_err(|e| JobError::ValidationError(e.to_string()))?;
        Ok(spec)
    }
}

/// Stable model identifier: every training run of one label in one environment shares it.
pub fn model_id(environment: &str, label: &str) -> String {
    hex::encode(Sha224::digest(format!("{}:{}", environment, label).as_bytes()))
}
