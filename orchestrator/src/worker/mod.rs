pub mod controller;
pub mod event_handler;
pub mod pool;
pub mod reconciler;
pub mod retry;
pub mod service;

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::core::config::Config;
use crate::worker::event_handler::service::JobHandlerService;
use crate::worker::service::JobService;
use crate::OrchestratorResult;
use controller::WorkerController;

/// Initializes the workers with the provided configuration
///
/// Jobs left behind by a previous process are recovered first: pending jobs are put back on their
/// queues and interrupted attempts go through the retry policy. Then one pool per job type and
/// the reconciler are started in the background.
///
/// # Arguments
/// * `config` - The configuration for the workers
/// * `shutdown_token` - Cancelled to stop every pool and the reconciler
///
/// # Returns
/// * `OrchestratorResult<WorkerController>` - The worker controller
pub async fn initialize_worker(
    config: Arc<Config>,
    shutdown_token: CancellationToken,
) -> OrchestratorResult<WorkerController> {
    // Pending jobs first: recovering an interrupted job enqueues it on its own.
    let requeued = JobService::requeue_pending_jobs(config.clone()).await?;
    let interrupted = JobHandlerService::recover_interrupted_jobs(config.clone()).await?;
    info!(interrupted, requeued, "Recovered jobs from the job store");

    let mut controller = WorkerController::new(config, shutdown_token);
    controller.start();
    Ok(controller)
}
