use std::time::Duration;

use crate::cli::reconciler::ReconcilerCliArgs;
use crate::OrchestratorError;

#[derive(Debug, Clone)]
pub struct ReconcilerParams {
    pub interval: Duration,
    /// Poll failures in a row tolerated before a submitted job is failed
    pub poll_failure_tolerance: u32,
    /// How long an unknown remote handle is tolerated
    pub unknown_grace_period: Duration,
    pub concurrency: usize,
}

impl TryFrom<ReconcilerCliArgs> for ReconcilerParams {
    type Error = OrchestratorError;
    fn try_from(args: ReconcilerCliArgs) -> Result<Self, Self::Error> {
        if args.reconcile_interval_seconds == 0 {
            return Err(OrchestratorError::RunCommandError("Reconcile interval must be greater than 0".to_string()));
        }
        Ok(Self {
            interval: Duration::from_secs(args.reconcile_interval_seconds),
            poll_failure_tolerance: args.poll_failure_tolerance,
            unknown_grace_period: Duration::from_secs(args.unknown_handle_grace_period_seconds),
            concurrency: args.reconcile_concurrency,
        })
    }
}

impl Default for ReconcilerParams {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(30),
            poll_failure_tolerance: 5,
            unknown_grace_period: Duration::from_secs(300),
            concurrency: 8,
        }
    }
}
