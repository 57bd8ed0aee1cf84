/// Worker controller for managing the worker pools and the reconciler
///
/// Spawns one pool per job type plus the reconciler, and drains them on shutdown.
use std::sync::Arc;
use std::time::Duration;

use strum::IntoEnumIterator;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, info_span, warn, Instrument};

use crate::core::config::Config;
use crate::types::jobs::types::JobType;
use crate::worker::pool::config::PoolConfig;
use crate::worker::pool::WorkerPool;
use crate::worker::reconciler::Reconciler;

/// Controller for managing workers
pub struct WorkerController {
    config: Arc<Config>,
    shutdown_token: CancellationToken,
    handles: Vec<JoinHandle<()>>,
}

impl WorkerController {
    /// Create a new worker controller
    pub fn new(config: Arc<Config>, shutdown_token: CancellationToken) -> Self {
        Self { config, shutdown_token, handles: Vec::new() }
    }

    /// Start a pool for every job type and the reconciler
    pub fn start(&mut self) {
        for job_type in JobType::iter() {
            let pool_config = PoolConfig::for_job_type(job_type, &self.config);
            let span = info_span!("worker_pool", queue = %pool_config.queue);
            let pool = WorkerPool::new(self.config.clone(), pool_config);
            let token = self.shutdown_token.clone();
            self.handles.push(tokio::spawn(pool.run(token).instrument(span)));
        }

        let reconciler = Reconciler::new(self.config.clone());
        let token = self.shutdown_token.clone();
        self.handles
            .push(tokio::spawn(async move { reconciler.run(token).await }.instrument(info_span!("reconciler"))));

        info!(task_count = self.handles.len(), "Worker pools and reconciler started");
    }

    /// Wait for all pools and the reconciler to complete (typically after shutdown signal)
    pub async fn wait_for_completion(&mut self) {
        for result in futures::future::join_all(self.handles.iter_mut()).await {
            if let Err(e) = result {
                error!(error = %e, "Worker task panicked");
            }
        }
        self.handles.clear();
    }

    /// Trigger shutdown and wait for in-flight jobs, at most `timeout`.
    pub async fn shutdown(&mut self, timeout: Duration) {
        info!("Initiating graceful shutdown of workers");
        self.shutdown_token.cancel();

        if tokio::time::timeout(timeout, self.wait_for_completion()).await.is_err() {
            warn!(timeout_secs = timeout.as_secs(), "Workers did not stop in time, aborting them");
            for handle in self.handles.drain(..) {
                handle.abort();
            }
        }
        self.config.queue().close().await;
        info!("Worker controller shutdown complete");
    }
}
