use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use mockall::predicate::eq;
use orchestrator_training_client_interface::{
    MockTrainingClient, RemoteStatus, TrainingClient, TrainingClientError, TrainingSpec,
};
use rstest::rstest;

use crate::core::config::Config;
use crate::tests::common::{build_job_item, create_job_in_db, get_job};
use crate::tests::config::{test_params, ConfigType, TestConfigBuilder};
use crate::types::jobs::job_item::JobItem;
use crate::types::jobs::job_updates::JobItemUpdates;
use crate::types::jobs::types::{JobStatus, JobType};
use crate::types::params::ReconcilerParams;
use crate::types::queue::QueueType;
use crate::worker::reconciler::{PassOutcome, ReconcileAction, Reconciler};

async fn setup(training_client: MockTrainingClient) -> Arc<Config> {
    TestConfigBuilder::new().configure_training_client(ConfigType::Mock(training_client)).build().await.config
}

async fn submitted_job(config: &Arc<Config>, attempt: u32) -> JobItem {
    create_job_in_db(config, JobType::RemoteTrain, JobStatus::Submitted, attempt).await
}

async fn reconcile(config: &Arc<Config>, job: JobItem) -> ReconcileAction {
    let reconciler = Reconciler::new(config.clone());
    let training_client = config.training_client().expect("training client is configured");
    reconciler.reconcile_job(training_client, job).await.unwrap()
}

#[tokio::test]
async fn succeeded_run_stores_its_result() {
    let mut training_client = MockTrainingClient::new();
    training_client.expect_poll().times(1).returning(|_| Ok(RemoteStatus::Succeeded));
    training_client
        .expect_fetch_result()
        .times(1)
        .returning(|handle| Ok(format!("gs://models/{}", handle)));
    let config = setup(training_client).await;
    let mut job = build_job_item(JobType::RemoteTrain, JobStatus::Submitted, 1);
    job.metadata.model_version = Some(3);
    let job = config.database().create_job(job).await.unwrap();
    let handle = job.remote_handle.clone().unwrap();

    assert_eq!(reconcile(&config, job.clone()).await, ReconcileAction::Transitioned(JobStatus::Succeeded));

    let job = get_job(&config, job.id).await;
    assert_eq!(job.status, JobStatus::Succeeded);
    assert_eq!(job.remote_handle, None);
    assert_eq!(job.result_location, Some(format!("gs://models/{}", handle)));
    assert_eq!(job.metadata.model_version, Some(3));
}

#[tokio::test]
async fn running_run_resets_failure_counters() {
    let mut training_client = MockTrainingClient::new();
    training_client.expect_poll().times(1).returning(|_| Ok(RemoteStatus::Running));
    let config = setup(training_client).await;
    let job = submitted_job(&config, 1).await;
    let mut metadata = job.metadata.clone();
    metadata.consecutive_poll_failures = 2;
    let job = config.database().update_job(&job, JobItemUpdates::new().update_metadata(metadata).build()).await.unwrap();

    assert_eq!(reconcile(&config, job.clone()).await, ReconcileAction::Unchanged);

    let job = get_job(&config, job.id).await;
    assert_eq!(job.status, JobStatus::Submitted);
    assert_eq!(job.metadata.consecutive_poll_failures, 0);
}

#[tokio::test]
async fn failed_run_is_retried_while_attempts_remain() {
    let mut training_client = MockTrainingClient::new();
    training_client.expect_poll().times(1).returning(|_| Ok(RemoteStatus::Failed("OOM".to_string())));
    let config = setup(training_client).await;
    let job = submitted_job(&config, 1).await;

    assert_eq!(reconcile(&config, job.clone()).await, ReconcileAction::Transitioned(JobStatus::Pending));

    let job = get_job(&config, job.id).await;
    assert_eq!(job.remote_handle, None);
    assert!(job.error.as_deref().unwrap_or_default().contains("OOM"));
    let message = tokio::time::timeout(Duration::from_secs(2), config.queue().consume_message(QueueType::RemoteTrainJobs))
        .await
        .expect("retry should be enqueued")
        .unwrap();
    assert_eq!(message.map(|m| m.id), Some(job.id));
}

#[tokio::test]
async fn failed_run_on_last_attempt_fails_the_job() {
    let mut training_client = MockTrainingClient::new();
    training_client.expect_poll().times(1).returning(|_| Ok(RemoteStatus::Failed("OOM".to_string())));
    let config = setup(training_client).await;
    let job = submitted_job(&config, 3).await;

    assert_eq!(reconcile(&config, job.clone()).await, ReconcileAction::Transitioned(JobStatus::Failed));
    assert_eq!(get_job(&config, job.id).await.remote_handle, None);
}

#[rstest]
#[case(JobStatus::Succeeded)]
#[case(JobStatus::Failed)]
#[case(JobStatus::Cancelled)]
#[case(JobStatus::Pending)]
#[tokio::test]
async fn jobs_that_are_not_submitted_are_never_polled(#[case] status: JobStatus) {
    let mut training_client = MockTrainingClient::new();
    training_client.expect_poll().times(0);
    training_client.expect_fetch_result().times(0);
    let config = setup(training_client).await;
    let job = create_job_in_db(&config, JobType::RemoteTrain, status, 1).await;

    assert_eq!(reconcile(&config, job.clone()).await, ReconcileAction::Skipped);
    assert_eq!(get_job(&config, job.id).await, job);
}

#[tokio::test]
async fn reconciling_a_finished_job_twice_changes_nothing() {
    let mut training_client = MockTrainingClient::new();
    // the second poll comes from the stale copy below
    training_client.expect_poll().times(2).returning(|_| Ok(RemoteStatus::Succeeded));
    training_client.expect_fetch_result().times(2).returning(|_| Ok("gs://models/final".to_string()));
    let config = setup(training_client).await;
    let job = submitted_job(&config, 1).await;
    let reconciler = Reconciler::new(config.clone());

    assert_eq!(reconciler.reconcile_once().await.unwrap(), PassOutcome::Completed(1));
    let finished = get_job(&config, job.id).await;
    assert_eq!(reconciler.reconcile_once().await.unwrap(), PassOutcome::Completed(0));
    // A stale copy still says submitted, its write loses the compare-and-set
    assert_eq!(reconcile(&config, job.clone()).await, ReconcileAction::Skipped);
    assert_eq!(get_job(&config, job.id).await, finished);
}

#[tokio::test]
async fn poll_errors_are_tolerated_up_to_the_limit() {
    let mut training_client = MockTrainingClient::new();
    training_client
        .expect_poll()
        .with(eq("run-flaky"))
        .times(3)
        .returning(|_| Err(TrainingClientError::TransientPoll("connection reset".to_string())));
    let config = setup(training_client).await;
    let job = submitted_job(&config, 1).await;
    let job = config
        .database()
        .update_job(&job, JobItemUpdates::new().update_remote_handle("run-flaky".to_string()).build())
        .await
        .unwrap();

    // tolerance is 3 in the test parameters
    assert_eq!(reconcile(&config, job.clone()).await, ReconcileAction::Deferred);
    assert_eq!(reconcile(&config, get_job(&config, job.id).await).await, ReconcileAction::Deferred);
    assert_eq!(get_job(&config, job.id).await.metadata.consecutive_poll_failures, 2);
    assert_eq!(
        reconcile(&config, get_job(&config, job.id).await).await,
        ReconcileAction::Transitioned(JobStatus::Failed)
    );

    let job = get_job(&config, job.id).await;
    assert!(job.error.as_deref().unwrap_or_default().contains("Polling failed 3 times"));
}

#[tokio::test]
async fn result_fetch_failure_counts_as_a_poll_failure() {
    let mut training_client = MockTrainingClient::new();
    training_client.expect_poll().times(1).returning(|_| Ok(RemoteStatus::Succeeded));
    training_client
        .expect_fetch_result()
        .times(1)
        .returning(|handle| Err(TrainingClientError::ResultNotReady(handle.to_string())));
    let config = setup(training_client).await;
    let job = submitted_job(&config, 1).await;

    assert_eq!(reconcile(&config, job.clone()).await, ReconcileAction::Deferred);

    let job = get_job(&config, job.id).await;
    assert_eq!(job.status, JobStatus::Submitted);
    assert_eq!(job.metadata.consecutive_poll_failures, 1);
}

#[tokio::test]
async fn missing_result_fails_the_job_without_exposing_the_contract_error() {
    let mut training_client = MockTrainingClient::new();
    training_client.expect_poll().times(3).returning(|_| Ok(RemoteStatus::Succeeded));
    training_client
        .expect_fetch_result()
        .times(3)
        .returning(|handle| Err(TrainingClientError::ResultNotReady(handle.to_string())));
    let config = setup(training_client).await;
    let job = submitted_job(&config, 1).await;

    // tolerance is 3 in the test parameters
    assert_eq!(reconcile(&config, job.clone()).await, ReconcileAction::Deferred);
    assert_eq!(reconcile(&config, get_job(&config, job.id).await).await, ReconcileAction::Deferred);
    assert_eq!(
        reconcile(&config, get_job(&config, job.id).await).await,
        ReconcileAction::Transitioned(JobStatus::Failed)
    );

    let job = get_job(&config, job.id).await;
    let error = job.error.expect("failed job records a reason");
    assert!(error.contains("could not be retrieved"));
    assert!(!error.contains("not ready"));
}

#[tokio::test]
async fn unknown_handle_gets_a_grace_period() {
    let mut training_client = MockTrainingClient::new();
    training_client.expect_poll().times(2).returning(|_| Ok(RemoteStatus::Unknown));
    let config = setup(training_client).await;
    let job = submitted_job(&config, 1).await;

    assert_eq!(reconcile(&config, job.clone()).await, ReconcileAction::Deferred);
    let waiting = get_job(&config, job.id).await;
    let since = waiting.metadata.unknown_since.expect("grace period should start");

    assert_eq!(reconcile(&config, waiting.clone()).await, ReconcileAction::Deferred);
    assert_eq!(get_job(&config, job.id).await.metadata.unknown_since, Some(since));
}

#[tokio::test]
async fn unknown_handle_past_its_grace_period_fails_the_job() {
    let mut training_client = MockTrainingClient::new();
    training_client.expect_poll().times(1).returning(|_| Ok(RemoteStatus::Unknown));
    let config = TestConfigBuilder::new()
        .configure_training_client(ConfigType::Mock(training_client))
        .configure_reconciler(ReconcilerParams { unknown_grace_period: Duration::from_secs(60), ..test_params().reconciler })
        .build()
        .await
        .config;
    let job = submitted_job(&config, 1).await;
    let mut metadata = job.metadata.clone();
    metadata.unknown_since = Some(Utc::now() - chrono::Duration::seconds(120));
    let job = config.database().update_job(&job, JobItemUpdates::new().update_metadata(metadata).build()).await.unwrap();

    // Permanent: a new submission could run twice if the old handle comes back
    assert_eq!(reconcile(&config, job.clone()).await, ReconcileAction::Transitioned(JobStatus::Failed));
    assert!(get_job(&config, job.id).await.error.as_deref().unwrap_or_default().contains("unknown"));
}

/// Answers every poll with `Running`, after a delay.
struct SlowTrainingClient;

#[async_trait]
impl TrainingClient for SlowTrainingClient {
    async fn submit(&self, _: TrainingSpec) -> Result<String, TrainingClientError> {
        unimplemented!("not submitted by the reconciler")
    }

    async fn poll(&self, _: &str) -> Result<RemoteStatus, TrainingClientError> {
        tokio::time::sleep(Duration::from_millis(50)).await;
        Ok(RemoteStatus::Running)
    }

    async fn fetch_result(&self, handle: &str) -> Result<String, TrainingClientError> {
        Err(TrainingClientError::ResultNotReady(handle.to_string()))
    }

    async fn cancel(&self, _: &str) -> Result<(), TrainingClientError> {
        Ok(())
    }
}

#[tokio::test]
async fn overlapping_passes_are_skipped() {
    let config = TestConfigBuilder::new().configure_training_client_with(SlowTrainingClient).build().await.config;
    submitted_job(&config, 1).await;
    let reconciler = Reconciler::new(config.clone());

    let (first, second) = tokio::join!(reconciler.reconcile_once(), reconciler.reconcile_once());

    let mut outcomes = vec![first.unwrap(), second.unwrap()];
    outcomes.sort_by_key(|outcome| matches!(outcome, PassOutcome::Skipped));
    assert_eq!(outcomes, vec![PassOutcome::Completed(1), PassOutcome::Skipped]);
}

#[tokio::test]
async fn pass_without_training_client_does_nothing() {
    let services = TestConfigBuilder::new().build().await;
    let config = services.config;
    let job = submitted_job(&config, 1).await;

    assert_eq!(Reconciler::new(config.clone()).reconcile_once().await.unwrap(), PassOutcome::Completed(0));
    assert_eq!(get_job(&config, job.id).await, job);
}
