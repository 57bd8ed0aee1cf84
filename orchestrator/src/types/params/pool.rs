use std::time::Duration;

use crate::cli::pool::WorkerPoolCliArgs;
use crate::types::jobs::types::JobType;
use crate::OrchestratorError;

/// Sizing of a single pool
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerPoolParams {
    /// Workers kept alive at all times
    pub target_workers: usize,
    /// Autoscale ceiling
    pub max_workers: usize,
    /// Jobs a worker instance runs before it is recycled
    pub max_jobs_per_worker: u32,
}

impl WorkerPoolParams {
    pub fn new(target_workers: usize, max_workers: usize, max_jobs_per_worker: u32) -> Self {
        Self { target_workers, max_workers: max_workers.max(target_workers).max(1), max_jobs_per_worker }
    }
}

#[derive(Debug, Clone)]
pub struct PoolParams {
    pub review: WorkerPoolParams,
    pub local_train: WorkerPoolParams,
    pub remote_train: WorkerPoolParams,
    pub scale_interval: Duration,
    pub idle_timeout: Duration,
}

impl PoolParams {
    pub fn for_job_type(&self, job_type: &JobType) -> &WorkerPoolParams {
        match job_type {
            JobType::Review => &self.review,
            JobType::LocalTrain => &self.local_train,
            JobType::RemoteTrain => &self.remote_train,
        }
    }
}

impl TryFrom<WorkerPoolCliArgs> for PoolParams {
    type Error = OrchestratorError;
    fn try_from(args: WorkerPoolCliArgs) -> Result<Self, Self::Error> {
        if args.pool_scale_interval_seconds == 0 {
            return Err(OrchestratorError::RunCommandError("Pool scale interval must be greater than 0".to_string()));
        }
        Ok(Self {
            review: WorkerPoolParams::new(args.review_workers, args.review_max_workers, args.review_max_jobs_per_worker),
            local_train: WorkerPoolParams::new(
                args.local_train_workers,
                args.local_train_max_workers,
                args.local_train_max_jobs_per_worker,
            ),
            remote_train: WorkerPoolParams::new(
                args.remote_train_workers,
                args.remote_train_max_workers,
                args.remote_train_max_jobs_per_worker,
            ),
            scale_interval: Duration::from_secs(args.pool_scale_interval_seconds),
            idle_timeout: Duration::from_secs(args.worker_idle_timeout_seconds),
        })
    }
}

impl Default for PoolParams {
    fn default() -> Self {
        Self {
            review: WorkerPoolParams::new(2, 4, 50),
            local_train: WorkerPoolParams::new(1, 2, 1),
            remote_train: WorkerPoolParams::new(2, 4, 100),
            scale_interval: Duration::from_secs(5),
            idle_timeout: Duration::from_secs(60),
        }
    }
}
