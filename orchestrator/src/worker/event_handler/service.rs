use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use chrono::Utc;
use futures::FutureExt;
use tracing::{debug, error, info, warn, Span};
use uuid::Uuid;

use crate::core::client::database::DatabaseError;
use crate::core::client::lock::error::LockError;
use crate::core::client::lock::{job_lock_key, LockResult};
use crate::core::config::Config;
use crate::error::job::JobError;
use crate::types::jobs::context::JobContext;
use crate::types::jobs::job_item::JobItem;
use crate::types::jobs::job_updates::JobItemUpdates;
use crate::types::jobs::types::JobStatus;
use crate::types::queue::{JobQueueMessage, QueueType};
use crate::worker::event_handler::jobs::JobOutcome;
use crate::worker::retry::{next_action, RetryAction};
use crate::worker::service::JobService;

/// What a worker did with one queue message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageOutcome {
    /// An attempt ran, the job ended up in the given status
    Executed(JobStatus),
    /// The job was not pending anymore (cancelled, already handled), nothing changed
    Skipped,
    /// Another worker held the job lock, the message was put back once
    Requeued,
    /// Another worker held the job lock again, the message was dropped
    Dropped,
}

pub struct JobHandlerService;

impl JobHandlerService {
    /// Takes the execution lock of the job referenced by `message` and processes it.
    ///
    /// A message whose job is locked by someone else is put back on `queue` once. A second
    /// collision drops it, the lock holder owns the job.
    pub async fn handle_message(
        queue: QueueType,
        message: JobQueueMessage,
        config: Arc<Config>,
        context: &JobContext,
    ) -> Result<MessageOutcome, JobError> {
        let id = message.id;
        let key = job_lock_key(&id);
        let ttl = config.service_config().job_lock_ttl.as_secs();

        match config.lock().acquire_lock(&key, &context.worker_id, ttl).await? {
            LockResult::Acquired => {}
            LockResult::AlreadyHeld(owner) if message.requeue_count == 0 => {
                warn!(job_id = %id, owner = %owner, "Job is locked by another worker, requeueing once");
                let requeued = JobQueueMessage { id, requeue_count: message.requeue_count + 1 };
                JobService::add_job_to_queue(config.clone(), requeued, queue, None).await?;
                return Ok(MessageOutcome::Requeued);
            }
            LockResult::AlreadyHeld(owner) => {
                warn!(job_id = %id, owner = %owner, "Job is still locked by another worker, dropping message");
                return Ok(MessageOutcome::Dropped);
            }
            other => {
                return Err(JobError::LockError(LockError::Other(format!(
                    "Unexpected lock result {:?} for {}",
                    other, key
                ))))
            }
        }

        let result = Self::process_job(id, config.clone(), context).await;

        if let Err(e) = config.lock().release_lock(&key, &context.worker_id).await {
            warn!(job_id = %id, error = %e, "Failed to release job lock");
        }
        result
    }

    /// Runs one attempt of a pending job: pending -> running -> {succeeded | submitted | pending | failed}
    #[tracing::instrument(
        skip(config, context),
        fields(
            job_id = %id,
            job_type = tracing::field::Empty,
            attempt = tracing::field::Empty,
            worker_id = %context.worker_id
        )
    )]
    pub async fn process_job(
        id: Uuid,
        config: Arc<Config>,
        context: &JobContext,
    ) -> Result<MessageOutcome, JobError> {
        let job = JobService::get_job(id, config.clone()).await?;
        Span::current().record("job_type", job.job_type.to_string().as_str());

        if job.status != JobStatus::Pending {
            debug!(job_status = %job.status, "Job is not pending, skipping");
            return Ok(MessageOutcome::Skipped);
        }

        let max_attempts = config.retry_config().max_attempts;
        if job.attempt >= max_attempts {
            warn!(attempt = job.attempt, max_attempts, "Job has no attempts left");
            let failed = JobService::move_job_to_failed(&job, config, "Maximum attempts reached".to_string()).await;
            return Self::settle(&job, failed.map(|j| j.status)).await;
        }

        let Some(job_handler) = config.job_handler(&job.job_type) else {
            let failed = JobService::move_job_to_failed(
                &job,
                config.clone(),
                format!("No handler registered for {} jobs", job.job_type),
            )
            .await;
            return Self::settle(&job, failed.map(|j| j.status)).await;
        };

        // Registered before the claim so that a cancellation seeing `running` always reaches us.
        let running = config.running_jobs().register(id);

        // Claim the job: the compare-and-set fails if it was cancelled since we read it.
        let mut metadata = job.metadata.clone();
        metadata.process_started_at = Some(Utc::now());
        metadata.process_completed_at = None;
        metadata.retry_not_before = None;
        metadata.worker_id = Some(context.worker_id.clone());
        let claim = JobItemUpdates::new()
            .update_status(JobStatus::Running)
            .update_attempt(job.attempt + 1)
            .clear_error()
            .update_metadata(metadata)
            .build();
        let job = match config.database().update_job(&job, claim).await {
            Ok(job) => job,
            Err(DatabaseError::UpdateFailed(_)) => {
                debug!("Job changed before it could be claimed, skipping");
                return Ok(MessageOutcome::Skipped);
            }
            Err(e) => return Err(e.into()),
        };
        Span::current().record("attempt", job.attempt);
        info!(max_attempts, "Processing job");

        let execution = AssertUnwindSafe(job_handler.process_job(config.clone(), &job, context)).catch_unwind();
        let result = tokio::select! {
            biased;
            _ = running.token().cancelled() => {
                // Dropping the execution stops it, a local command is killed with it.
                info!("Job was cancelled while running, execution stopped");
                return Ok(MessageOutcome::Executed(JobStatus::Cancelled));
            }
            executed = execution => match executed {
                Ok(result) => result,
                Err(panic) => {
                    let message = Self::extract_panic_message(&panic);
                    error!(panic = %message, "Job handler panicked");
                    Err(JobError::Panicked(message))
                }
            },
        };
        drop(running);

        let settled = match result {
            Ok(outcome) => Self::complete_job(&job, outcome, config.clone()).await,
            Err(e) => {
                error!(error = %e, "Failed to process job");
                Self::handle_processing_failure(&job, e, config.clone()).await
            }
        };
        match settled {
            Err(JobError::DatabaseError(DatabaseError::UpdateFailed(reason))) => {
                Self::resolve_lost_update(&job, reason, config).await
            }
            other => other.map(MessageOutcome::Executed),
        }
    }

    /// Writes the terminal (local) or submitted (remote) state of a successful attempt
    async fn complete_job(job: &JobItem, outcome: JobOutcome, config: Arc<Config>) -> Result<JobStatus, JobError> {
        let mut metadata = job.metadata.clone();
        if let Some(version) = outcome.model_version() {
            metadata.model_version = Some(version);
        }
        let updates = match &outcome {
            JobOutcome::Completed { result_location, .. } => {
                metadata.process_completed_at = Some(Utc::now());
                JobItemUpdates::new()
                    .update_status(JobStatus::Succeeded)
                    .update_result_location(result_location.clone())
                    .update_metadata(metadata)
            }
            JobOutcome::Submitted { remote_handle, .. } => {
                metadata.submitted_at = Some(Utc::now());
                metadata.consecutive_poll_failures = 0;
                metadata.unknown_since = None;
                JobItemUpdates::new()
                    .update_status(JobStatus::Submitted)
                    .update_remote_handle(remote_handle.clone())
                    .update_metadata(metadata)
            }
        };

        match config.database().update_job(job, updates.build()).await {
            Ok(updated) => {
                info!(job_status = %updated.status, "Job processed");
                Ok(updated.status)
            }
            Err(DatabaseError::UpdateFailed(reason)) => {
                // The job left `running` under our feet, a submitted run must not keep going unseen.
                if let JobOutcome::Submitted { remote_handle, .. } = &outcome {
                    JobService::cancel_remote_run(job.id, remote_handle, config).await;
                }
                Err(DatabaseError::UpdateFailed(reason).into())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Applies the retry policy to a failed attempt: back to `pending` with a delay, or `failed`.
    pub(crate) async fn handle_processing_failure(
        job: &JobItem,
        error: JobError,
        config: Arc<Config>,
    ) -> Result<JobStatus, JobError> {
        let reason = error.to_string();
        match next_action(config.retry_config(), job.attempt, error.class()) {
            RetryAction::RetryAfter(delay) => {
                Ok(JobService::schedule_retry(job, reason, delay, config).await?.status)
            }
            RetryAction::GiveUp => Ok(JobService::move_job_to_failed(job, config, reason).await?.status),
        }
    }

    /// The job was changed by someone else while we held it. Only a cancellation may do that.
    async fn resolve_lost_update(
        job: &JobItem,
        reason: String,
        config: Arc<Config>,
    ) -> Result<MessageOutcome, JobError> {
        let current = JobService::get_job(job.id, config).await?;
        if current.status == JobStatus::Cancelled {
            info!("Job was cancelled while running, result discarded");
            return Ok(MessageOutcome::Executed(JobStatus::Cancelled));
        }
        error!(job_status = %current.status, version = current.version, "Job was changed while running");
        Err(JobError::DatabaseError(DatabaseError::UpdateFailed(reason)))
    }

    async fn settle(job: &JobItem, result: Result<JobStatus, JobError>) -> Result<MessageOutcome, JobError> {
        match result {
            Ok(status) => Ok(MessageOutcome::Executed(status)),
            Err(JobError::DatabaseError(DatabaseError::UpdateFailed(_))) => {
                debug!(job_id = %job.id, "Job changed concurrently, skipping");
                Ok(MessageOutcome::Skipped)
            }
            Err(e) => Err(e),
        }
    }

    /// Handles jobs left `running` by a previous orchestrator process. The interrupted attempt
    /// counts as a transient failure.
    pub async fn recover_interrupted_jobs(config: Arc<Config>) -> Result<usize, JobError> {
        let running = config.database().get_jobs_by_types_and_statuses(vec![], vec![JobStatus::Running], None).await?;
        for job in &running {
            let interrupted = JobError::TransientExecutionError("interrupted by an orchestrator restart".to_string());
            match Self::handle_processing_failure(job, interrupted, config.clone()).await {
                Ok(status) => info!(job_id = %job.id, job_status = %status, "Recovered interrupted job"),
                Err(e) => error!(job_id = %job.id, error = %e, "Failed to recover interrupted job"),
            }
        }
        Ok(running.len())
    }

    fn extract_panic_message(panic: &Box<dyn std::any::Any + Send>) -> String {
        panic
            .downcast_ref::<String>()
            .map(|s| s.as_str())
            .or_else(|| panic.downcast_ref::<&str>().copied())
            .unwrap_or("Unknown panic")
            .to_string()
    }
}
