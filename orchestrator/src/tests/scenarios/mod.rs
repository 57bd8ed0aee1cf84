//! End-to-end runs through the worker controller with in-memory infrastructure.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use assert_matches::assert_matches;
use mockall::predicate::eq;
use orchestrator_training_client_interface::{MockTrainingClient, RemoteStatus};
use tokio_util::sync::CancellationToken;

use crate::core::client::runner::{MockLocalRunner, RunnerError};
use crate::error::job::JobError;
use crate::tests::common::{review_payload, training_payload, wait_for_status};
use crate::tests::config::{ConfigType, TestConfigBuilder};
use crate::tests::workers::completing_handler;
use crate::types::jobs::types::{JobStatus, JobType};
use crate::types::params::RetryParams;
use crate::types::queue::QueueType;
use crate::worker::initialize_worker;
use crate::worker::service::JobService;

#[tokio::test(start_paused = true)]
async fn always_transient_local_training_fails_after_max_attempts() {
    let attempts = Arc::new(AtomicU32::new(0));
    let mut runner = MockLocalRunner::new();
    let seen = attempts.clone();
    runner.expect_run().times(3).returning(move |_, _, _| {
        seen.fetch_add(1, Ordering::SeqCst);
        Err(RunnerError::Transient("GPU busy".to_string()))
    });
    let services = TestConfigBuilder::new()
        .configure_retry(RetryParams {
            max_attempts: 3,
            backoff_base: Duration::from_secs(1),
            backoff_cap: Duration::from_secs(300),
        })
        .configure_local_runner(ConfigType::Mock(runner))
        .build()
        .await;
    let config = services.config;
    let mut controller = initialize_worker(config.clone(), CancellationToken::new()).await.unwrap();

    let id = JobService::submit_job("local-train", training_payload(), config.clone()).await.unwrap();
    let job = wait_for_status(&config, id, JobStatus::Failed, Duration::from_secs(60)).await;

    assert_eq!(job.attempt, 3);
    assert_eq!(attempts.load(Ordering::SeqCst), 3);
    assert!(job.error.as_deref().unwrap_or_default().contains("GPU busy"));
    controller.shutdown(Duration::from_secs(5)).await;
}

#[tokio::test]
async fn remote_training_is_followed_until_it_succeeds() {
    let polls = AtomicU32::new(0);
    let mut training_client = MockTrainingClient::new();
    training_client.expect_submit().times(1).returning(|_| Ok("h1".to_string()));
    training_client.expect_poll().with(eq("h1")).times(3).returning(move |_| {
        if polls.fetch_add(1, Ordering::SeqCst) < 2 {
            Ok(RemoteStatus::Running)
        } else {
            Ok(RemoteStatus::Succeeded)
        }
    });
    training_client.expect_fetch_result().with(eq("h1")).times(1).returning(|_| Ok("gs://models/h1".to_string()));
    let services =
        TestConfigBuilder::new().configure_training_client(ConfigType::Mock(training_client)).build().await;
    let config = services.config;
    let mut controller = initialize_worker(config.clone(), CancellationToken::new()).await.unwrap();

    let id = JobService::submit_job("remote-train", training_payload(), config.clone()).await.unwrap();
    let job = wait_for_status(&config, id, JobStatus::Succeeded, Duration::from_secs(5)).await;

    assert_eq!(job.result_location.as_deref(), Some("gs://models/h1"));
    assert_eq!(job.remote_handle, None);
    assert_eq!(job.attempt, 1);
    controller.shutdown(Duration::from_secs(5)).await;
}

#[tokio::test]
async fn bogus_kind_is_refused_without_a_record() {
    let services = TestConfigBuilder::new().build().await;
    let config = services.config;

    let result = JobService::submit_job("bogus", review_payload(), config.clone()).await;

    assert_matches!(result, Err(JobError::InvalidKind(_)));
    assert!(config.database().get_jobs_by_types_and_statuses(vec![], vec![], None).await.unwrap().is_empty());
}

#[tokio::test]
async fn job_cancelled_before_pickup_is_never_executed() {
    let services = TestConfigBuilder::new().configure_handler(JobType::Review, completing_handler(0)).build().await;
    let config = services.config;
    let id = JobService::submit_job("review", review_payload(), config.clone()).await.unwrap();
    JobService::cancel_job(id, config.clone()).await.unwrap();

    let mut controller = initialize_worker(config.clone(), CancellationToken::new()).await.unwrap();
    tokio::time::sleep(Duration::from_millis(200)).await;

    assert_eq!(config.queue().queue_depth(QueueType::ReviewJobs).await.unwrap(), 0);
    let job = JobService::get_job(id, config.clone()).await.unwrap();
    assert_eq!(job.status, JobStatus::Cancelled);
    assert_eq!(job.attempt, 0);
    controller.shutdown(Duration::from_secs(5)).await;
}
