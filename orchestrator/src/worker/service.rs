use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use uuid::Uuid;

use crate::core::client::database::DatabaseError;
use crate::core::config::Config;
use crate::error::job::JobError;
use crate::error::other::OtherError;
use crate::types::jobs::job_item::JobItem;
use crate::types::jobs::job_updates::JobItemUpdates;
use crate::types::jobs::types::{JobStatus, JobType};
use crate::types::jobs::view::JobView;
use crate::types::queue::{JobQueueMessage, QueueNameForJobType, QueueType};

/// Compare-and-set attempts a cancellation makes before giving up on a job that keeps changing
const CANCEL_MAX_ATTEMPTS: usize = 5;

/// Upper bound of jobs returned by a single listing
pub const LIST_JOBS_MAX_LIMIT: i64 = 1000;

pub struct JobService;

impl JobService {
    /// Creates a `pending` job of kind `kind` and puts it on the matching queue.
    ///
    /// # Arguments
    /// * `kind` - One of `review`, `local-train`, `remote-train`
    /// * `payload` - Request body, validated by the handler when the job runs
    /// * `config` - Shared configuration
    ///
    /// # Returns
    /// * `Result<Uuid, JobError>` - The id of the new job, or `InvalidKind` without creating anything
    pub async fn submit_job(kind: &str, payload: serde_json::Value, config: Arc<Config>) -> Result<Uuid, JobError> {
        let job_type = JobType::from_str(kind).map_err(|_| JobError::InvalidKind(kind.to_string()))?;
        let job = Self::create_job(job_type, payload, config).await?;
        Ok(job.id)
    }

    /// Creates a `pending` job and enqueues it.
    ///
    /// If the job cannot be enqueued it is moved to `failed` right away so that no record waits
    /// for a message that will never come.
    pub async fn create_job(
        job_type: JobType,
        payload: serde_json::Value,
        config: Arc<Config>,
    ) -> Result<JobItem, JobError> {
        let job = config.database().create_job(JobItem::create(job_type, payload)).await?;
        tracing::info!(job_id = %job.id, job_type = %job_type, "Created job");

        if let Err(e) = Self::add_job_to_process_queue(job.id, &job_type, config.clone()).await {
            Self::move_job_to_failed(&job, config, format!("Failed to enqueue job: {}", e)).await?;
            return Err(e);
        }
        Ok(job)
    }

    /// Retrieves a job by its ID from the database
    ///
    /// # Returns
    /// * `Result<JobItem, JobError>` - The job if found, or JobNotFound error
    pub async fn get_job(id: Uuid, config: Arc<Config>) -> Result<JobItem, JobError> {
        config.database().get_job_by_id(id).await?.ok_or(JobError::JobNotFound { id })
    }

    pub async fn get_job_view(id: Uuid, config: Arc<Config>) -> Result<JobView, JobError> {
        Ok(Self::get_job(id, config).await?.into())
    }

    /// Lists jobs, oldest first, optionally filtered by kind and status
    pub async fn list_jobs(
        kind: Option<JobType>,
        status: Option<JobStatus>,
        limit: Option<i64>,
        config: Arc<Config>,
    ) -> Result<Vec<JobView>, JobError> {
        let limit = limit.unwrap_or(LIST_JOBS_MAX_LIMIT).clamp(1, LIST_JOBS_MAX_LIMIT);
        let jobs = config
            .database()
            .get_jobs_by_types_and_statuses(kind.into_iter().collect(), status.into_iter().collect(), Some(limit))
            .await?;
        Ok(jobs.into_iter().map(JobView::from).collect())
    }

    /// Marks a job as `cancelled`.
    ///
    /// A pending job is also taken off its queue. A running attempt in this process is signalled
    /// and stops at its next await point; an attempt elsewhere notices when it writes its result.
    /// For submitted jobs the remote run is asked to stop, but only the local tracking is
    /// guaranteed to end.
    ///
    /// # Returns
    /// * `Result<JobItem, JobError>` - The cancelled job, or `NotCancellable` for finished jobs
    pub async fn cancel_job(id: Uuid, config: Arc<Config>) -> Result<JobItem, JobError> {
        for _ in 0..CANCEL_MAX_ATTEMPTS {
            let job = Self::get_job(id, config.clone()).await?;
            if job.status.is_terminal() {
                return Err(JobError::NotCancellable { id, status: job.status });
            }

            let mut metadata = job.metadata.clone();
            metadata.process_completed_at = Some(Utc::now());
            let mut updates = JobItemUpdates::new().update_status(JobStatus::Cancelled).update_metadata(metadata);
            if job.remote_handle.is_some() {
                updates = updates.clear_remote_handle();
            }

            match config.database().update_job(&job, updates.build()).await {
                Ok(cancelled) => {
                    Self::after_cancel(&job, config.clone()).await;
                    tracing::info!(job_id = %id, previous_status = %job.status, "Job cancelled");
                    return Ok(cancelled);
                }
                Err(DatabaseError::UpdateFailed(_)) => {
                    tracing::debug!(job_id = %id, "Job changed while cancelling, retrying");
                }
                Err(e) => return Err(e.into()),
            }
        }
        Err(JobError::Other(OtherError::from(format!(
            "Job {} kept changing, gave up cancelling after {} attempts",
            id, CANCEL_MAX_ATTEMPTS
        ))))
    }

    /// Side effects of a cancellation, all best effort: the job is already cancelled.
    async fn after_cancel(previous: &JobItem, config: Arc<Config>) {
        match previous.status {
            JobStatus::Pending => {
                let queue = previous.job_type.queue_name();
                match config.queue().remove_job(queue, previous.id).await {
                    Ok(removed) => tracing::debug!(job_id = %previous.id, removed, "Removed cancelled job from queue"),
                    Err(e) => tracing::warn!(job_id = %previous.id, error = %e, "Failed to remove cancelled job from queue"),
                }
            }
            JobStatus::Running => {
                let signalled = config.running_jobs().cancel(&previous.id);
                tracing::debug!(job_id = %previous.id, signalled, "Signalled running attempt to stop");
            }
            JobStatus::Submitted => {
                if let Some(handle) = previous.remote_handle.as_deref() {
                    Self::cancel_remote_run(previous.id, handle, config).await;
                }
            }
            _ => {}
        }
    }

    /// Asks the training platform to stop a run. Failures are only logged.
    pub(crate) async fn cancel_remote_run(id: Uuid, remote_handle: &str, config: Arc<Config>) {
        let Some(training_client) = config.training_client() else {
            return;
        };
        match training_client.cancel(remote_handle).await {
            Ok(()) => tracing::info!(job_id = %id, remote_handle = %remote_handle, "Remote run cancellation requested"),
            Err(e) => tracing::warn!(
                job_id = %id,
                remote_handle = %remote_handle,
                error = %e,
                "Failed to cancel remote run, it is no longer tracked"
            ),
        }
    }

    /// Add a job into the queue with the given delay
    pub(crate) async fn add_job_to_queue(
        config: Arc<Config>,
        message: JobQueueMessage,
        queue: QueueType,
        delay: Option<Duration>,
    ) -> Result<(), JobError> {
        let id = message.id;
        config.queue().send_message(queue, message, delay).await.inspect_err(|e| {
            tracing::error!(
                queue = %queue,
                job_id = %id,
                error = ?e,
                "Failed to send message to queue"
            );
        })?;

        tracing::debug!(
            queue = %queue,
            job_id = %id,
            delay_secs = ?delay.map(|d| d.as_secs()),
            "Sent message to queue"
        );
        Ok(())
    }

    /// Adds a job to its processing queue
    pub async fn add_job_to_process_queue(id: Uuid, job_type: &JobType, config: Arc<Config>) -> Result<(), JobError> {
        Self::add_job_to_queue(config, JobQueueMessage::new(id), job_type.queue_name(), None).await
    }

    /// Moves a failed attempt back to `pending` and enqueues it again once `delay` elapsed.
    ///
    /// The failure reason stays on the job until the next attempt starts.
    pub async fn schedule_retry(
        job: &JobItem,
        reason: String,
        delay: Duration,
        config: Arc<Config>,
    ) -> Result<JobItem, JobError> {
        let mut metadata = job.metadata.clone();
        metadata.retry_not_before = chrono::Duration::from_std(delay).ok().map(|d| Utc::now() + d);
        metadata.consecutive_poll_failures = 0;
        metadata.unknown_since = None;

        let mut updates =
            JobItemUpdates::new().update_status(JobStatus::Pending).update_error(reason).update_metadata(metadata);
        if job.remote_handle.is_some() {
            updates = updates.clear_remote_handle();
        }
        let pending = config.database().update_job(job, updates.build()).await?;

        tracing::info!(
            job_id = %job.id,
            attempt = job.attempt,
            max_attempts = config.retry_config().max_attempts,
            delay_secs = delay.as_secs(),
            "Job failed, retrying"
        );
        Self::add_job_to_queue(config, JobQueueMessage::new(job.id), job.job_type.queue_name(), Some(delay)).await?;
        Ok(pending)
    }

    /// Moves a job to the Failed state with the provided reason
    ///
    /// # Notes
    /// * Skips jobs that already finished
    /// * Clears the remote handle of submitted jobs
    pub async fn move_job_to_failed(job: &JobItem, config: Arc<Config>, reason: String) -> Result<JobItem, JobError> {
        if job.status.is_terminal() {
            tracing::warn!(job_id = %job.id, job_status = %job.status, "Job already finished, not marking it failed");
            return Ok(job.clone());
        }

        let mut metadata = job.metadata.clone();
        metadata.process_completed_at = Some(Utc::now());
        let mut updates =
            JobItemUpdates::new().update_status(JobStatus::Failed).update_error(reason.clone()).update_metadata(metadata);
        if job.remote_handle.is_some() {
            updates = updates.clear_remote_handle();
        }

        let failed = config.database().update_job(job, updates.build()).await.inspect_err(|e| {
            tracing::error!(job_id = %job.id, error = %e, "Failed to mark job as failed");
        })?;
        tracing::warn!(job_id = %job.id, job_type = %job.job_type, attempt = job.attempt, reason = %reason, "Job failed");
        Ok(failed)
    }

    /// Puts every `pending` job back on its queue, honouring pending retry delays.
    ///
    /// Used at start-up with a persistent store: the queues live in memory and start empty.
    pub async fn requeue_pending_jobs(config: Arc<Config>) -> Result<usize, JobError> {
        let pending = config.database().get_jobs_by_types_and_statuses(vec![], vec![JobStatus::Pending], None).await?;
        let now = Utc::now();
        for job in &pending {
            let delay = job.metadata.retry_not_before.and_then(|at| (at - now).to_std().ok());
            Self::add_job_to_queue(config.clone(), JobQueueMessage::new(job.id), job.job_type.queue_name(), delay)
                .await?;
        }
        Ok(pending.len())
    }
}
