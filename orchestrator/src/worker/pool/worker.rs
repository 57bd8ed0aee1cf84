use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::core::config::Config;
use crate::types::jobs::context::JobContext;
use crate::types::queue::QueueType;
use crate::worker::event_handler::service::{JobHandlerService, MessageOutcome};

/// Pause after a queue error before consuming again
const QUEUE_ERROR_BACKOFF: Duration = Duration::from_secs(1);

/// Why a worker instance stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerExit {
    /// Executed its maximum number of jobs
    Recycled,
    /// Extra worker that found no work within the idle timeout
    Idle,
    /// Shutdown requested or queue closed
    Shutdown,
}

/// A single executor: takes one job at a time from its queue.
pub struct Worker {
    id: String,
    queue: QueueType,
    config: Arc<Config>,
    max_jobs: u32,
    /// Only extra workers time out, core workers wait for work indefinitely
    idle_timeout: Option<Duration>,
    /// Workers of the pool currently waiting for a message
    idle_workers: Arc<AtomicUsize>,
    /// Removed when the worker is dropped
    scratch_dir: TempDir,
    jobs_run: u32,
}

/// Keeps the pool's idle counter right whichever way the wait ends.
struct IdleGuard<'a>(&'a AtomicUsize);

impl<'a> IdleGuard<'a> {
    fn new(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for IdleGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl Worker {
    pub fn new(
        id: String,
        queue: QueueType,
        config: Arc<Config>,
        max_jobs: u32,
        idle_timeout: Option<Duration>,
        idle_workers: Arc<AtomicUsize>,
    ) -> std::io::Result<Self> {
        let scratch_dir = tempfile::Builder::new().prefix(&format!("{}-", id)).tempdir()?;
        Ok(Self { id, queue, config, max_jobs, idle_timeout, idle_workers, scratch_dir, jobs_run: 0 })
    }

    /// Run the worker loop until it is recycled, idles out or is shut down.
    ///
    /// Shutdown is only observed between jobs, a job in progress always runs to its end.
    pub async fn run(mut self, shutdown_token: CancellationToken) -> WorkerExit {
        let context = JobContext::new(self.id.clone(), self.scratch_dir.path());
        debug!(worker_id = %self.id, queue = %self.queue, "Worker started");

        loop {
            if self.jobs_run >= self.max_jobs {
                info!(worker_id = %self.id, jobs_run = self.jobs_run, "Worker reached its job limit, recycling");
                return WorkerExit::Recycled;
            }

            let consumed = {
                let _idle = IdleGuard::new(&self.idle_workers);
                let consume = self.config.queue().consume_message(self.queue);
                tokio::select! {
                    _ = shutdown_token.cancelled() => return WorkerExit::Shutdown,
                    consumed = Self::with_idle_timeout(self.idle_timeout, consume) => consumed,
                }
            };

            let message = match consumed {
                None => {
                    debug!(worker_id = %self.id, "No work within the idle timeout, exiting");
                    return WorkerExit::Idle;
                }
                Some(Ok(Some(message))) => message,
                Some(Ok(None)) => return WorkerExit::Shutdown,
                Some(Err(e)) => {
                    error!(worker_id = %self.id, queue = %self.queue, error = %e, "Failed to consume message");
                    tokio::select! {
                        _ = shutdown_token.cancelled() => return WorkerExit::Shutdown,
                        _ = tokio::time::sleep(QUEUE_ERROR_BACKOFF) => continue,
                    }
                }
            };

            match JobHandlerService::handle_message(self.queue, message.clone(), self.config.clone(), &context).await {
                Ok(MessageOutcome::Executed(status)) => {
                    self.jobs_run += 1;
                    debug!(worker_id = %self.id, job_id = %message.id, job_status = %status, "Job attempt finished");
                }
                Ok(outcome) => debug!(worker_id = %self.id, job_id = %message.id, ?outcome, "Message handled"),
                Err(e) => {
                    warn!(worker_id = %self.id, job_id = %message.id, error = %e, "Failed to handle message");
                }
            }
        }
    }

    async fn with_idle_timeout<F: std::future::Future>(timeout: Option<Duration>, future: F) -> Option<F::Output> {
        match timeout {
            Some(timeout) => tokio::time::timeout(timeout, future).await.ok(),
            None => Some(future.await),
        }
    }
}
