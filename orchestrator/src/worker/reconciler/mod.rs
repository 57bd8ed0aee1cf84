//! Follows submitted remote training runs until they finish.

use std::sync::Arc;

use chrono::Utc;
use futures::stream::{self, StreamExt};
use orchestrator_training_client_interface::{RemoteStatus, TrainingClient, TrainingClientError};
use tokio::sync::Mutex;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::core::client::database::DatabaseError;
use crate::core::config::Config;
use crate::error::job::{ErrorClass, JobError};
use crate::types::jobs::job_item::JobItem;
use crate::types::jobs::job_updates::JobItemUpdates;
use crate::types::jobs::metadata::CommonMetadata;
use crate::types::jobs::types::{JobStatus, JobType};
use crate::worker::retry::{next_action, RetryAction};
use crate::worker::service::JobService;

/// Result of one reconciliation pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassOutcome {
    /// The pass looked at this many submitted jobs
    Completed(usize),
    /// Another pass was still active, nothing was done
    Skipped,
}

/// What the reconciler did with a single submitted job
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileAction {
    /// Still running remotely
    Unchanged,
    /// Poll failed or the handle is unknown, tolerated for now
    Deferred,
    /// Moved to the given status
    Transitioned(JobStatus),
    /// The job was not submitted anymore or changed concurrently
    Skipped,
}

pub struct Reconciler {
    config: Arc<Config>,
    /// Held for the whole pass, only one pass may run at a time
    pass_guard: Mutex<()>,
}

impl Reconciler {
    pub fn new(config: Arc<Config>) -> Self {
        Self { config, pass_guard: Mutex::new(()) }
    }

    /// Reconciles every `reconcile_interval` until `shutdown_token` is cancelled.
    pub async fn run(&self, shutdown_token: CancellationToken) {
        let interval = self.config.reconciler_config().interval;
        info!(interval_secs = interval.as_secs(), "Starting reconciler");

        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            tokio::select! {
                _ = shutdown_token.cancelled() => break,
                _ = ticker.tick() => {
                    match self.reconcile_once().await {
                        Ok(PassOutcome::Completed(count)) => debug!(jobs = count, "Reconciliation pass completed"),
                        Ok(PassOutcome::Skipped) => debug!("Reconciliation pass skipped, previous pass still active"),
                        Err(e) => error!(error = %e, "Reconciliation pass failed"),
                    }
                }
            }
        }
        info!("Reconciler stopped");
    }

    /// Runs a single pass over all submitted jobs, unless another pass is active.
    pub async fn reconcile_once(&self) -> Result<PassOutcome, JobError> {
        let Ok(_guard) = self.pass_guard.try_lock() else {
            return Ok(PassOutcome::Skipped);
        };
        let Some(training_client) = self.config.training_client() else {
            let submitted = self.config.database().count_jobs_by_status(JobStatus::Submitted).await?;
            if submitted > 0 {
                warn!(submitted, "Submitted jobs exist but no training client is configured, skipping pass");
            }
            return Ok(PassOutcome::Completed(0));
        };

        let jobs = self
            .config
            .database()
            .get_jobs_by_types_and_statuses(vec![JobType::RemoteTrain], vec![JobStatus::Submitted], None)
            .await?;
        let count = jobs.len();
        let concurrency = self.config.reconciler_config().concurrency.max(1);

        stream::iter(jobs)
            .for_each_concurrent(concurrency, |job| async move {
                let id = job.id;
                match self.reconcile_job(training_client, job).await {
                    Ok(action) => debug!(job_id = %id, ?action, "Job reconciled"),
                    Err(e) => error!(job_id = %id, error = %e, "Failed to reconcile job"),
                }
            })
            .await;
        Ok(PassOutcome::Completed(count))
    }

    /// Polls the remote run of one job and writes whatever changed.
    #[tracing::instrument(
        skip(self, training_client, job),
        fields(job_id = %job.id, remote_handle = tracing::field::Empty)
    )]
    pub async fn reconcile_job(
        &self,
        training_client: &dyn TrainingClient,
        job: JobItem,
    ) -> Result<ReconcileAction, JobError> {
        // Terminal and pending jobs are never polled, that keeps a re-poll of a finished job a no-op.
        if job.status != JobStatus::Submitted {
            return Ok(ReconcileAction::Skipped);
        }
        let Some(handle) = job.remote_handle.clone() else {
            error!("Submitted job without remote handle");
            return Ok(ReconcileAction::Skipped);
        };
        tracing::Span::current().record("remote_handle", handle.as_str());

        let result = match training_client.poll(&handle).await {
            Ok(RemoteStatus::Running) => self.mark_running(&job).await,
            Ok(RemoteStatus::Succeeded) => match training_client.fetch_result(&handle).await {
                Ok(result_location) => self.mark_succeeded(&job, result_location).await,
                Err(e) => {
                    error!(error = %e, "Platform reported success but the result is not available");
                    self.record_poll_failure(&job, e).await
                }
            },
            Ok(RemoteStatus::Failed(message)) => {
                warn!(message = %message, "Remote training run failed");
                self.fail_attempt(&job, format!("Remote training failed: {}", message), ErrorClass::Transient).await
            }
            Ok(RemoteStatus::Unknown) => self.handle_unknown(&job).await,
            Err(e) => {
                warn!(error = %e, "Failed to poll remote training run");
                self.record_poll_failure(&job, e).await
            }
        };

        match result {
            Err(JobError::DatabaseError(DatabaseError::UpdateFailed(_))) => {
                debug!("Job changed during reconciliation, skipping");
                Ok(ReconcileAction::Skipped)
            }
            other => other,
        }
    }

    fn healthy_metadata(job: &JobItem) -> CommonMetadata {
        let mut metadata = job.metadata.clone();
        metadata.consecutive_poll_failures = 0;
        metadata.unknown_since = None;
        metadata
    }

    async fn mark_running(&self, job: &JobItem) -> Result<ReconcileAction, JobError> {
        let updates = JobItemUpdates::new().update_metadata(Self::healthy_metadata(job)).build();
        self.config.database().update_job(job, updates).await?;
        Ok(ReconcileAction::Unchanged)
    }

    async fn mark_succeeded(&self, job: &JobItem, result_location: String) -> Result<ReconcileAction, JobError> {
        let mut metadata = Self::healthy_metadata(job);
        metadata.process_completed_at = Some(Utc::now());
        let updates = JobItemUpdates::new()
            .update_status(JobStatus::Succeeded)
            .clear_remote_handle()
            .update_result_location(result_location.clone())
            .update_metadata(metadata)
            .build();
        self.config.database().update_job(job, updates).await?;
        info!(result_location = %result_location, "Remote training run succeeded");
        Ok(ReconcileAction::Transitioned(JobStatus::Succeeded))
    }

    async fn handle_unknown(&self, job: &JobItem) -> Result<ReconcileAction, JobError> {
        let now = Utc::now();
        let grace_period = self.config.reconciler_config().unknown_grace_period;
        match job.metadata.unknown_since {
            Some(since) if (now - since).to_std().is_ok_and(|elapsed| elapsed >= grace_period) => {
                self.fail_attempt(
                    job,
                    format!("Remote handle unknown to the platform since {}", since.to_rfc3339()),
                    ErrorClass::Permanent,
                )
                .await
            }
            Some(_) => Ok(ReconcileAction::Deferred),
            None => {
                debug!("Remote handle unknown, starting grace period");
                let mut metadata = job.metadata.clone();
                metadata.unknown_since = Some(now);
                self.config.database().update_job(job, JobItemUpdates::new().update_metadata(metadata).build()).await?;
                Ok(ReconcileAction::Deferred)
            }
        }
    }

    async fn record_poll_failure(
        &self,
        job: &JobItem,
        error: TrainingClientError,
    ) -> Result<ReconcileAction, JobError> {
        let tolerance = self.config.reconciler_config().poll_failure_tolerance;
        let failures = job.metadata.consecutive_poll_failures.saturating_add(1);
        if failures >= tolerance {
            error!(error = %error, failures, "Poll failure tolerance reached");
            let reason = match error {
                // A missing result after a success is our contract problem, not something to show users.
                TrainingClientError::ResultNotReady(_) => {
                    format!("Result of the remote training run could not be retrieved after {} polls", failures)
                }
                other => format!("Polling failed {} times in a row, last error: {}", failures, other),
            };
            return self.fail_attempt(job, reason, ErrorClass::Permanent).await;
        }
        let mut metadata = job.metadata.clone();
        metadata.consecutive_poll_failures = failures;
        self.config.database().update_job(job, JobItemUpdates::new().update_metadata(metadata).build()).await?;
        Ok(ReconcileAction::Deferred)
    }

    /// Ends the current remote attempt: retried through the shared policy or failed for good.
    async fn fail_attempt(
        &self,
        job: &JobItem,
        reason: String,
        class: ErrorClass,
    ) -> Result<ReconcileAction, JobError> {
        let updated = match next_action(self.config.retry_config(), job.attempt, class) {
            RetryAction::RetryAfter(delay) => JobService::schedule_retry(job, reason, delay, self.config.clone()).await?,
            RetryAction::GiveUp => JobService::move_job_to_failed(job, self.config.clone(), reason).await?,
        };
        Ok(ReconcileAction::Transitioned(updated.status))
    }
}
