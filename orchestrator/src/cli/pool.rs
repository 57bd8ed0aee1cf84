use clap::Args;

use crate::cli::service::{parse_positive_u32, parse_positive_u64, parse_positive_usize};

/// Sizing of the worker pools, one pool per job kind.
#[derive(Debug, Clone, Args)]
pub struct WorkerPoolCliArgs {
    /// Workers kept alive for review jobs.
    #[arg(env = "ORCHESTRATOR_REVIEW_WORKERS", long, default_value = "2")]
    pub review_workers: usize,

    /// Autoscale ceiling for review jobs.
    #[arg(env = "ORCHESTRATOR_REVIEW_MAX_WORKERS", long, default_value = "4", value_parser = parse_positive_usize)]
    pub review_max_workers: usize,

    /// Review jobs a worker instance runs before it is recycled.
    #[arg(env = "ORCHESTRATOR_REVIEW_MAX_JOBS_PER_WORKER", long, default_value = "50", value_parser = parse_positive_u32)]
    pub review_max_jobs_per_worker: u32,

    /// Workers kept alive for local training jobs.
    #[arg(env = "ORCHESTRATOR_LOCAL_TRAIN_WORKERS", long, default_value = "1")]
    pub local_train_workers: usize,

    /// Autoscale ceiling for local training jobs.
    #[arg(env = "ORCHESTRATOR_LOCAL_TRAIN_MAX_WORKERS", long, default_value = "2", value_parser = parse_positive_usize)]
    pub local_train_max_workers: usize,

    /// Local training jobs a worker instance runs before it is recycled.
    #[arg(env = "ORCHESTRATOR_LOCAL_TRAIN_MAX_JOBS_PER_WORKER", long, default_value = "1", value_parser = parse_positive_u32)]
    pub local_train_max_jobs_per_worker: u32,

    /// Workers kept alive for remote training jobs.
    #[arg(env = "ORCHESTRATOR_REMOTE_TRAIN_WORKERS", long, default_value = "2")]
    pub remote_train_workers: usize,

    /// Autoscale ceiling for remote training jobs.
    #[arg(env = "ORCHESTRATOR_REMOTE_TRAIN_MAX_WORKERS", long, default_value = "4", value_parser = parse_positive_usize)]
    pub remote_train_max_workers: usize,

    /// Remote training jobs a worker instance submits before it is recycled.
    #[arg(env = "ORCHESTRATOR_REMOTE_TRAIN_MAX_JOBS_PER_WORKER", long, default_value = "100", value_parser = parse_positive_u32)]
    pub remote_train_max_jobs_per_worker: u32,

    /// How often a pool compares its backlog with its idle workers, in seconds.
    #[arg(env = "ORCHESTRATOR_POOL_SCALE_INTERVAL_SECONDS", long, default_value = "5", value_parser = parse_positive_u64)]
    pub pool_scale_interval_seconds: u64,

    /// Idle time after which a worker above the target count exits, in seconds.
    #[arg(env = "ORCHESTRATOR_WORKER_IDLE_TIMEOUT_SECONDS", long, default_value = "60")]
    pub worker_idle_timeout_seconds: u64,
}
