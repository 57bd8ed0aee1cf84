use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Bookkeeping shared by every job kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommonMetadata {
    /// Start of the latest execution attempt
    pub process_started_at: Option<DateTime<Utc>>,
    /// End of the latest execution attempt (local jobs) or of the remote run
    pub process_completed_at: Option<DateTime<Utc>>,
    /// When the remote platform accepted the job
    pub submitted_at: Option<DateTime<Utc>>,
    /// Poll errors in a row since the last successful poll
    #[serde(default)]
    pub consecutive_poll_failures: u32,
    /// First time the platform reported the remote handle as unknown
    pub unknown_since: Option<DateTime<Utc>>,
    /// Worker instance that ran the latest attempt
    pub worker_id: Option<String>,
    /// Earliest time the next retry may start
    pub retry_not_before: Option<DateTime<Utc>>,
    /// Model version produced by a training job, allocated on its first run
    #[serde(default)]
    pub model_version: Option<u32>,
}
