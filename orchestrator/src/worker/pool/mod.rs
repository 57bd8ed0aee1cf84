pub mod config;
pub mod worker;

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::task::JoinSet;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::core::config::Config;
use config::PoolConfig;
use worker::{Worker, WorkerExit};

/// Core workers are replaced when they exit, extra workers only live while there is demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WorkerRole {
    Core,
    Extra,
}

/// Auto-scaling set of workers consuming one queue.
pub struct WorkerPool {
    config: Arc<Config>,
    pool_config: PoolConfig,
    workers: JoinSet<(WorkerRole, WorkerExit)>,
    idle_workers: Arc<AtomicUsize>,
    next_worker_number: AtomicU64,
    core_alive: usize,
    extra_alive: usize,
}

impl WorkerPool {
    pub fn new(config: Arc<Config>, pool_config: PoolConfig) -> Self {
        Self {
            config,
            pool_config,
            workers: JoinSet::new(),
            idle_workers: Arc::new(AtomicUsize::new(0)),
            next_worker_number: AtomicU64::new(0),
            core_alive: 0,
            extra_alive: 0,
        }
    }

    fn alive(&self) -> usize {
        self.core_alive + self.extra_alive
    }

    fn spawn_worker(&mut self, role: WorkerRole, shutdown_token: &CancellationToken) {
        let number = self.next_worker_number.fetch_add(1, Ordering::SeqCst);
        let id = format!("{}-{}", self.pool_config.queue, number);
        let idle_timeout = match role {
            WorkerRole::Core => None,
            WorkerRole::Extra => Some(self.pool_config.idle_timeout),
        };
        let worker = match Worker::new(
            id.clone(),
            self.pool_config.queue,
            self.config.clone(),
            self.pool_config.max_jobs_per_worker,
            idle_timeout,
            self.idle_workers.clone(),
        ) {
            Ok(worker) => worker,
            Err(e) => {
                error!(worker_id = %id, error = %e, "Failed to create worker scratch directory");
                return;
            }
        };

        match role {
            WorkerRole::Core => self.core_alive += 1,
            WorkerRole::Extra => self.extra_alive += 1,
        }
        let token = shutdown_token.clone();
        self.workers.spawn(async move { (role, worker.run(token).await) });
        debug!(worker_id = %id, ?role, "Worker spawned");
    }

    /// Spawns extra workers when more messages wait than workers idle, up to the ceiling.
    async fn scale(&mut self, shutdown_token: &CancellationToken) {
        let depth = match self.config.queue().queue_depth(self.pool_config.queue).await {
            Ok(depth) => depth,
            Err(e) => {
                warn!(queue = %self.pool_config.queue, error = %e, "Failed to read queue depth");
                return;
            }
        };
        let idle = self.idle_workers.load(Ordering::SeqCst);
        let headroom = self.pool_config.max_workers.saturating_sub(self.alive());
        let wanted = depth.saturating_sub(idle).min(headroom);
        if wanted > 0 {
            info!(queue = %self.pool_config.queue, depth, idle, spawning = wanted, "Scaling up worker pool");
            for _ in 0..wanted {
                self.spawn_worker(WorkerRole::Extra, shutdown_token);
            }
        }
    }

    fn on_worker_exit(&mut self, role: WorkerRole, exit: Option<WorkerExit>, shutdown_token: &CancellationToken) {
        match role {
            WorkerRole::Core => self.core_alive = self.core_alive.saturating_sub(1),
            WorkerRole::Extra => self.extra_alive = self.extra_alive.saturating_sub(1),
        }
        if shutdown_token.is_cancelled() || exit == Some(WorkerExit::Shutdown) {
            return;
        }
        if role == WorkerRole::Core && self.core_alive < self.pool_config.target_workers {
            self.spawn_worker(WorkerRole::Core, shutdown_token);
        }
    }

    /// Runs the pool until `shutdown_token` is cancelled, then waits for every worker to finish its
    /// current job.
    pub async fn run(mut self, shutdown_token: CancellationToken) {
        info!(
            job_type = %self.pool_config.job_type,
            queue = %self.pool_config.queue,
            target_workers = self.pool_config.target_workers,
            max_workers = self.pool_config.max_workers,
            max_jobs_per_worker = self.pool_config.max_jobs_per_worker,
            "Starting worker pool"
        );
        for _ in 0..self.pool_config.target_workers {
            self.spawn_worker(WorkerRole::Core, &shutdown_token);
        }

        let mut scale_interval = tokio::time::interval(self.pool_config.scale_interval);
        scale_interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = shutdown_token.cancelled() => break,
                _ = scale_interval.tick() => self.scale(&shutdown_token).await,
                Some(joined) = self.workers.join_next(), if !self.workers.is_empty() => {
                    match joined {
                        Ok((role, exit)) => {
                            debug!(queue = %self.pool_config.queue, ?role, ?exit, "Worker exited");
                            self.on_worker_exit(role, Some(exit), &shutdown_token);
                        }
                        Err(e) => {
                            error!(queue = %self.pool_config.queue, error = %e, "Worker task panicked");
                            // The role is lost with the task, assume a core worker so the pool keeps its size.
                            self.on_worker_exit(WorkerRole::Core, None, &shutdown_token);
                        }
                    }
                }
            }
        }

        while let Some(joined) = self.workers.join_next().await {
            if let Err(e) = joined {
                error!(queue = %self.pool_config.queue, error = %e, "Worker task panicked during shutdown");
            }
        }
        info!(queue = %self.pool_config.queue, "Worker pool stopped");
    }
}
