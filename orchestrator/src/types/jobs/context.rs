use std::path::PathBuf;

/// What a worker hands to the job it executes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobContext {
    /// Identifier of the executing worker instance, e.g. `review_jobs-3`
    pub worker_id: String,
    /// Scratch directory owned by the worker instance, removed when it is recycled
    pub scratch_dir: PathBuf,
}

impl JobContext {
    pub fn new(worker_id: impl Into<String>, scratch_dir: impl Into<PathBuf>) -> Self {
        Self { worker_id: worker_id.into(), scratch_dir: scratch_dir.into() }
    }
}
