use std::time::Duration;

use crate::core::config::Config;
use crate::types::jobs::types::JobType;
use crate::types::queue::{QueueNameForJobType, QueueType};

/// Configuration of the pool serving one job type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolConfig {
    pub job_type: JobType,
    pub queue: QueueType,
    /// Core workers, always kept alive
    pub target_workers: usize,
    /// Ceiling for core plus extra workers
    pub max_workers: usize,
    /// Jobs a worker instance executes before it is recycled
    pub max_jobs_per_worker: u32,
    /// How often queue depth is compared with idle workers
    pub scale_interval: Duration,
    /// Extra workers exit after waiting this long without work
    pub idle_timeout: Duration,
}

impl PoolConfig {
    pub fn for_job_type(job_type: JobType, config: &Config) -> Self {
        let pools = config.pool_config();
        let params = pools.for_job_type(&job_type);
        Self {
            job_type,
            queue: job_type.queue_name(),
            target_workers: params.target_workers,
            max_workers: params.max_workers,
            max_jobs_per_worker: params.max_jobs_per_worker,
            scale_interval: pools.scale_interval,
            idle_timeout: pools.idle_timeout,
        }
    }
}
