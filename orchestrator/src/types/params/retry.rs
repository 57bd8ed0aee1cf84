use std::time::Duration;

use crate::cli::service::ServiceCliArgs;

/// Retry budget and backoff shape shared by the workers and the reconciler
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryParams {
    /// Attempts allowed per job, the first execution included
    pub max_attempts: u32,
    pub backoff_base: Duration,
    pub backoff_cap: Duration,
}

impl From<&ServiceCliArgs> for RetryParams {
    fn from(args: &ServiceCliArgs) -> Self {
        Self {
            max_attempts: args.max_attempts,
            backoff_base: Duration::from_secs(args.retry_backoff_base_seconds),
            backoff_cap: Duration::from_secs(args.retry_backoff_cap_seconds),
        }
    }
}

impl Default for RetryParams {
    fn default() -> Self {
        Self { max_attempts: 3, backoff_base: Duration::from_secs(5), backoff_cap: Duration::from_secs(300) }
    }
}
