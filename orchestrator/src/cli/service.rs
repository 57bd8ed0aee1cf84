use clap::Args;

pub(crate) fn parse_positive_u32(s: &str) -> Result<u32, String> {
    let value: u32 = s.parse().map_err(|_| format!("'{}' is not a valid number", s))?;
    if value == 0 {
        return Err("value must be greater than 0".to_string());
    }
    Ok(value)
}

pub(crate) fn parse_positive_usize(s: &str) -> Result<usize, String> {
    let value: usize = s.parse().map_err(|_| format!("'{}' is not a valid number", s))?;
    if value == 0 {
        return Err("value must be greater than 0".to_string());
    }
    Ok(value)
}

pub(crate) fn parse_positive_u64(s: &str) -> Result<u64, String> {
    let value: u64 = s.parse().map_err(|_| format!("'{}' is not a valid number", s))?;
    if value == 0 {
        return Err("value must be greater than 0".to_string());
    }
    Ok(value)
}

#[derive(Debug, Clone, Args)]
pub struct ServiceCliArgs {
    /// Deployment environment name. Part of every model identifier.
    #[arg(env = "ORCHESTRATOR_ENVIRONMENT", long, default_value = "dev")]
    pub environment: String,

    /// Maximum number of execution attempts of a job, retries included.
    #[arg(env = "ORCHESTRATOR_MAX_ATTEMPTS", long, default_value = "3", value_parser = parse_positive_u32)]
    pub max_attempts: u32,

    /// Base delay of the exponential retry backoff, in seconds.
    #[arg(env = "ORCHESTRATOR_RETRY_BACKOFF_BASE_SECONDS", long, default_value = "5")]
    pub retry_backoff_base_seconds: u64,

    /// Upper bound of the retry backoff, in seconds.
    #[arg(env = "ORCHESTRATOR_RETRY_BACKOFF_CAP_SECONDS", long, default_value = "300")]
    pub retry_backoff_cap_seconds: u64,

    /// Expiry of the per-job execution lock, in seconds.
    #[arg(env = "ORCHESTRATOR_JOB_LOCK_TTL_SECONDS", long, default_value = "3600")]
    pub job_lock_ttl_seconds: u64,

    /// Time given to workers, reconciler and server to stop after a shutdown signal.
    #[arg(env = "ORCHESTRATOR_SHUTDOWN_TIMEOUT_SECONDS", long, default_value = "120")]
    pub shutdown_timeout_seconds: u64,
}
