use assert_matches::assert_matches;
use orchestrator_training_client_interface::{MockTrainingClient, TrainingClientError};
use rstest::rstest;
use serde_json::json;
use tempfile::TempDir;

use crate::core::client::runner::{MockLocalRunner, RunnerError};
use crate::error::job::{ErrorClass, JobError};
use crate::tests::common::{build_job_item, job_context};
use crate::tests::config::{ConfigType, TestConfigBuilder};
use crate::types::jobs::context::JobContext;
use crate::types::jobs::payloads::model_id;
use crate::types::jobs::types::{JobStatus, JobType};
use crate::worker::event_handler::jobs::local_training::LocalTrainingJobHandler;
use crate::worker::event_handler::jobs::remote_training::RemoteTrainingJobHandler;
use crate::worker::event_handler::jobs::review::ReviewJobHandler;
use crate::worker::event_handler::jobs::{JobHandlerTrait, JobOutcome};

#[rstest]
#[tokio::test]
async fn review_job_runs_locally(job_context: (TempDir, JobContext)) {
    let (_dir, context) = job_context;
    let mut runner = MockLocalRunner::new();
    runner
        .expect_run()
        .withf(|job_type, input, context| {
            *job_type == JobType::Review
                && input["input"]["task_id"] == "42"
                && input["input"]["max_per_dp"] == 3
                && context.worker_id == "test-worker-0"
        })
        .times(1)
        .returning(|_, _, _| Ok("gs://reviews/42.jsonl".to_string()));
    let services = TestConfigBuilder::new().configure_local_runner(ConfigType::Mock(runner)).build().await;
    let job = build_job_item(JobType::Review, JobStatus::Running, 1);

    let outcome = ReviewJobHandler.process_job(services.config, &job, &context).await.unwrap();

    assert_eq!(outcome, JobOutcome::Completed { result_location: "gs://reviews/42.jsonl".to_string(), model_version: None });
}

#[rstest]
#[tokio::test]
async fn invalid_review_payload_never_reaches_the_runner(job_context: (TempDir, JobContext)) {
    let (_dir, context) = job_context;
    let mut runner = MockLocalRunner::new();
    runner.expect_run().times(0);
    let services = TestConfigBuilder::new().configure_local_runner(ConfigType::Mock(runner)).build().await;
    let mut job = build_job_item(JobType::Review, JobStatus::Running, 1);
    job.payload = json!({"entity_type": "company"});

    let result = ReviewJobHandler.process_job(services.config, &job, &context).await;

    assert_matches!(result, Err(JobError::ValidationError(_)));
}

#[rstest]
#[case(RunnerError::Transient("exit code 75".into()), ErrorClass::Transient)]
#[case(RunnerError::Failed("exit code 1".into()), ErrorClass::Permanent)]
#[case(RunnerError::NotConfigured(JobType::LocalTrain), ErrorClass::Permanent)]
#[tokio::test]
async fn local_training_failures_keep_their_class(
    job_context: (TempDir, JobContext),
    #[case] failure: RunnerError,
    #[case] expected: ErrorClass,
) {
    let (_dir, context) = job_context;
    let mut runner = MockLocalRunner::new();
    let mut failure = Some(failure);
    runner
        .expect_run()
        .times(1)
        .returning(move |_, _, _| Err(failure.take().expect("runner is called once")));
    let services = TestConfigBuilder::new().configure_local_runner(ConfigType::Mock(runner)).build().await;
    let job = build_job_item(JobType::LocalTrain, JobStatus::Running, 1);

    let error = LocalTrainingJobHandler.process_job(services.config, &job, &context).await.unwrap_err();

    assert_eq!(error.class(), expected);
}

#[rstest]
#[tokio::test]
async fn local_training_hands_the_spec_to_the_runner(job_context: (TempDir, JobContext)) {
    let (_dir, context) = job_context;
    let expected_model_id = model_id("test", "b2b");
    let mut runner = MockLocalRunner::new();
    runner
        .expect_run()
        .withf(move |job_type, input, _| {
            *job_type == JobType::LocalTrain
                && input["input"]["model_id"] == expected_model_id.as_str()
                && input["input"]["version"] == 1
                && input["input"]["train_config"]["num_train_epochs"] == 2
                && input["attempt"] == 1
        })
        .times(1)
        .returning(|_, _, _| Ok("gs://models/b2b/1".to_string()));
    let services = TestConfigBuilder::new().configure_local_runner(ConfigType::Mock(runner)).build().await;
    let job = build_job_item(JobType::LocalTrain, JobStatus::Running, 1);

    let outcome = LocalTrainingJobHandler.process_job(services.config, &job, &context).await.unwrap();

    assert_eq!(outcome, JobOutcome::Completed { result_location: "gs://models/b2b/1".to_string(), model_version: Some(1) });
}

#[rstest]
#[tokio::test]
async fn remote_training_returns_the_remote_handle(job_context: (TempDir, JobContext)) {
    let (_dir, context) = job_context;
    let mut training_client = MockTrainingClient::new();
    training_client
        .expect_submit()
        .withf(|spec| spec.label == "b2b" && spec.data_reference == "gs://exports/b2b.jsonl" && spec.version == 1)
        .times(1)
        .returning(|_| Ok("run-7".to_string()));
    let services =
        TestConfigBuilder::new().configure_training_client(ConfigType::Mock(training_client)).build().await;
    let job = build_job_item(JobType::RemoteTrain, JobStatus::Running, 1);

    let outcome = RemoteTrainingJobHandler.process_job(services.config, &job, &context).await.unwrap();

    assert_eq!(outcome, JobOutcome::Submitted { remote_handle: "run-7".to_string(), model_version: Some(1) });
}

#[rstest]
#[tokio::test]
async fn each_training_run_gets_the_next_version_of_its_model(job_context: (TempDir, JobContext)) {
    let (_dir, context) = job_context;
    let mut runner = MockLocalRunner::new();
    runner.expect_run().times(3).returning(|_, input, _| Ok(format!("gs://models/b2b/{}", input["input"]["version"])));
    let services = TestConfigBuilder::new().configure_local_runner(ConfigType::Mock(runner)).build().await;
    let b2b_model = model_id("test", "b2b");
    let other_model = model_id("test", "b2c");
    assert_eq!(services.config.database().next_model_version(&other_model).await.unwrap(), 1);

    let mut versions = Vec::new();
    for _ in 0..2 {
        let job = build_job_item(JobType::LocalTrain, JobStatus::Running, 1);
        let outcome = LocalTrainingJobHandler.process_job(services.config.clone(), &job, &context).await.unwrap();
        versions.push(outcome.model_version());
    }
    assert_eq!(versions, vec![Some(1), Some(2)]);

    // A job that already holds a version keeps it on a later run.
    let mut rerun = build_job_item(JobType::LocalTrain, JobStatus::Running, 2);
    rerun.metadata.model_version = Some(1);
    let outcome = LocalTrainingJobHandler.process_job(services.config.clone(), &rerun, &context).await.unwrap();
    assert_eq!(
        outcome,
        JobOutcome::Completed { result_location: "gs://models/b2b/1".to_string(), model_version: Some(1) }
    );

    assert_eq!(services.config.database().next_model_version(&b2b_model).await.unwrap(), 3);
    assert_eq!(services.config.database().next_model_version(&other_model).await.unwrap(), 2);
}

#[rstest]
#[tokio::test]
async fn remote_training_without_platform_is_permanent(job_context: (TempDir, JobContext)) {
    let (_dir, context) = job_context;
    let services = TestConfigBuilder::new().build().await;
    let job = build_job_item(JobType::RemoteTrain, JobStatus::Running, 1);

    let error = RemoteTrainingJobHandler.process_job(services.config, &job, &context).await.unwrap_err();

    assert_matches!(error, JobError::TrainingClientNotConfigured);
    assert_eq!(error.class(), ErrorClass::Permanent);
}

#[rstest]
#[case(TrainingClientError::Throttled("quota".into()), ErrorClass::Transient)]
#[case(TrainingClientError::Rejected("machine type".into()), ErrorClass::Permanent)]
#[tokio::test]
async fn remote_submission_errors_keep_their_class(
    job_context: (TempDir, JobContext),
    #[case] failure: TrainingClientError,
    #[case] expected: ErrorClass,
) {
    let (_dir, context) = job_context;
    let mut training_client = MockTrainingClient::new();
    let mut failure = Some(failure);
    training_client
        .expect_submit()
        .times(1)
        .returning(move |_| Err(failure.take().expect("submit is called once")));
    let services =
        TestConfigBuilder::new().configure_training_client(ConfigType::Mock(training_client)).build().await;
    let job = build_job_item(JobType::RemoteTrain, JobStatus::Running, 1);

    let error = RemoteTrainingJobHandler.process_job(services.config, &job, &context).await.unwrap_err();

    assert_eq!(error.class(), expected);
}
