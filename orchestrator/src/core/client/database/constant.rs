pub const JOBS_COLLECTION: &str = "jobs";
pub const MODEL_VERSIONS_COLLECTION: &str = "model_versions";
