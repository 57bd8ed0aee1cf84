use clap::Args;

use crate::cli::service::{parse_positive_u32, parse_positive_u64, parse_positive_usize};

#[derive(Debug, Clone, Args)]
pub struct ReconcilerCliArgs {
    /// Interval between two reconciliation passes, in seconds.
    #[arg(env = "ORCHESTRATOR_RECONCILE_INTERVAL_SECONDS", long, default_value = "30", value_parser = parse_positive_u64)]
    pub reconcile_interval_seconds: u64,

    /// Poll failures in a row after which a submitted job is failed.
    #[arg(env = "ORCHESTRATOR_POLL_FAILURE_TOLERANCE", long, default_value = "5", value_parser = parse_positive_u32)]
    pub poll_failure_tolerance: u32,

    /// How long the platform may report a handle as unknown before the job is failed, in seconds.
    #[arg(env = "ORCHESTRATOR_UNKNOWN_HANDLE_GRACE_PERIOD_SECONDS", long, default_value = "300")]
    pub unknown_handle_grace_period_seconds: u64,

    /// Submitted jobs polled in parallel during one pass.
    #[arg(env = "ORCHESTRATOR_RECONCILE_CONCURRENCY", long, default_value = "8", value_parser = parse_positive_usize)]
    pub reconcile_concurrency: usize,
}
