use std::sync::Arc;
use std::time::Duration;

use assert_matches::assert_matches;
use rstest::rstest;

use crate::core::client::database::{DatabaseClient, DatabaseError};
use crate::core::client::{InMemoryDatabase, MongoDbClient};
use crate::tests::common::build_job_item;
use crate::types::jobs::job_updates::JobItemUpdates;
use crate::types::jobs::types::{JobStatus, JobType};
use crate::types::params::database::MongoConfig;

/// Behaviour every job store must share.
async fn job_store_contract(database: &dyn DatabaseClient) {
    let job = database.create_job(build_job_item(JobType::Review, JobStatus::Pending, 0)).await.unwrap();
    assert_eq!(database.get_job_by_id(job.id).await.unwrap(), Some(job.clone()));

    // duplicate ids are rejected
    assert_matches!(database.create_job(job.clone()).await, Err(DatabaseError::ItemAlreadyExists(_)));

    // the store bumps the version and never moves updated_at backwards
    let running = database
        .update_job(&job, JobItemUpdates::new().update_status(JobStatus::Running).update_attempt(1).build())
        .await
        .unwrap();
    assert_eq!(running.version, job.version + 1);
    assert_eq!(running.attempt, 1);
    assert!(running.updated_at >= job.updated_at);

    // a stale copy loses
    let stale = database.update_job(&job, JobItemUpdates::new().update_status(JobStatus::Cancelled).build()).await;
    assert_matches!(stale, Err(DatabaseError::UpdateFailed(_)));

    // an update breaking a field/status pairing is refused and leaves the job alone
    let inconsistent =
        database.update_job(&running, JobItemUpdates::new().update_status(JobStatus::Submitted).build()).await;
    assert_matches!(inconsistent, Err(DatabaseError::InvalidUpdate(_)));
    assert_eq!(database.get_job_by_id(job.id).await.unwrap(), Some(running.clone()));

    assert_matches!(database.update_job(&running, JobItemUpdates::new().build()).await, Err(DatabaseError::NoUpdateFound(_)));

    let submitted = database
        .update_job(
            &running,
            JobItemUpdates::new().update_status(JobStatus::Submitted).update_remote_handle("run-1".to_string()).build(),
        )
        .await
        .unwrap();
    assert_eq!(submitted.remote_handle.as_deref(), Some("run-1"));
    assert_eq!(database.count_jobs_by_status(JobStatus::Submitted).await.unwrap(), 1);
}

/// Writers racing from the same snapshot: exactly one of them may win.
async fn racing_updates_have_a_single_winner(database: Arc<dyn DatabaseClient>) {
    const WRITERS: usize = 16;
    let job = database.create_job(build_job_item(JobType::Review, JobStatus::Pending, 0)).await.unwrap();

    let racers: Vec<_> = (0..WRITERS)
        .map(|n| {
            let database = database.clone();
            let snapshot = job.clone();
            tokio::spawn(async move {
                let mut metadata = snapshot.metadata.clone();
                metadata.worker_id = Some(format!("worker-{}", n));
                let updates =
                    JobItemUpdates::new().update_status(JobStatus::Running).update_attempt(1).update_metadata(metadata);
                database.update_job(&snapshot, updates.build()).await
            })
        })
        .collect();

    let mut winners = Vec::new();
    for racer in racers {
        match racer.await.unwrap() {
            Ok(updated) => winners.push(updated),
            Err(e) => assert_matches!(e, DatabaseError::UpdateFailed(_)),
        }
    }

    assert_eq!(winners.len(), 1);
    let stored = database.get_job_by_id(job.id).await.unwrap().unwrap();
    assert_eq!(stored, winners[0]);
    assert_eq!(stored.version, job.version + 1);
}

/// Versions are allocated per model, from 1, and never handed out twice.
async fn model_versions_are_allocated_once(database: Arc<dyn DatabaseClient>) {
    const ALLOCATIONS: u32 = 8;
    let racers: Vec<_> = (0..ALLOCATIONS)
        .map(|_| {
            let database = database.clone();
            tokio::spawn(async move { database.next_model_version("model-a").await })
        })
        .collect();

    let mut versions = Vec::new();
    for racer in racers {
        versions.push(racer.await.unwrap().unwrap());
    }
    versions.sort_unstable();
    assert_eq!(versions, (1..=ALLOCATIONS).collect::<Vec<_>>());

    assert_eq!(database.next_model_version("model-b").await.unwrap(), 1);
    assert_eq!(database.next_model_version("model-a").await.unwrap(), ALLOCATIONS + 1);
}

#[tokio::test]
async fn in_memory_store_honours_the_job_store_contract() {
    job_store_contract(&InMemoryDatabase::new()).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn in_memory_store_lets_one_of_many_racing_writers_win() {
    racing_updates_have_a_single_winner(Arc::new(InMemoryDatabase::new())).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn in_memory_store_allocates_each_model_version_once() {
    model_versions_are_allocated_once(Arc::new(InMemoryDatabase::new())).await;
}

/// Needs a running MongoDB: `ORCHESTRATOR_TEST_MONGODB_URI=mongodb://localhost:27017 cargo test -- --ignored`
#[tokio::test]
#[ignore = "requires a MongoDB instance"]
async fn mongodb_store_honours_the_job_store_contract() {
    let connection_url = std::env::var("ORCHESTRATOR_TEST_MONGODB_URI").expect("ORCHESTRATOR_TEST_MONGODB_URI is not set");
    let config = MongoConfig { connection_url, database_name: format!("orchestrator_test_{}", uuid::Uuid::new_v4().simple()) };
    let database = Arc::new(MongoDbClient::new(&config).await.expect("Failed to connect to MongoDB"));

    job_store_contract(database.as_ref()).await;
    racing_updates_have_a_single_winner(database.clone()).await;
    model_versions_are_allocated_once(database.clone()).await;

    database.client().database(&config.database_name).drop(None).await.unwrap();
    database.disconnect().await.unwrap();
}

#[tokio::test]
async fn creating_an_inconsistent_job_is_refused() {
    let database = InMemoryDatabase::new();
    let mut job = build_job_item(JobType::RemoteTrain, JobStatus::Pending, 0);
    job.remote_handle = Some("run-1".to_string());

    assert_matches!(database.create_job(job.clone()).await, Err(DatabaseError::InvalidUpdate(_)));
    assert_eq!(database.get_job_by_id(job.id).await.unwrap(), None);
}

#[rstest]
#[case(vec![], vec![], None, 4)]
#[case(vec![JobType::Review], vec![], None, 2)]
#[case(vec![JobType::Review], vec![JobStatus::Pending], None, 1)]
#[case(vec![], vec![JobStatus::Submitted, JobStatus::Pending], None, 3)]
#[case(vec![], vec![], Some(3), 3)]
#[tokio::test]
async fn jobs_are_filtered_by_type_and_status(
    #[case] job_types: Vec<JobType>,
    #[case] statuses: Vec<JobStatus>,
    #[case] limit: Option<i64>,
    #[case] expected: usize,
) {
    let database = InMemoryDatabase::new();
    for (job_type, status) in [
        (JobType::Review, JobStatus::Pending),
        (JobType::Review, JobStatus::Succeeded),
        (JobType::RemoteTrain, JobStatus::Submitted),
        (JobType::LocalTrain, JobStatus::Pending),
    ] {
        database.create_job(build_job_item(job_type, status, 1)).await.unwrap();
    }

    let jobs = database.get_jobs_by_types_and_statuses(job_types.clone(), statuses.clone(), limit).await.unwrap();
    assert_eq!(jobs.len(), expected);
    assert!(jobs.iter().all(|job| job_types.is_empty() || job_types.contains(&job.job_type)));
    assert!(jobs.iter().all(|job| statuses.is_empty() || statuses.contains(&job.status)));
}

#[tokio::test]
async fn jobs_are_listed_oldest_first() {
    let database = InMemoryDatabase::new();
    let mut created = Vec::new();
    for _ in 0..3 {
        created.push(database.create_job(build_job_item(JobType::Review, JobStatus::Pending, 0)).await.unwrap().id);
        tokio::time::sleep(Duration::from_millis(2)).await;
    }

    let listed: Vec<_> =
        database.get_jobs_by_types_and_statuses(vec![], vec![], None).await.unwrap().into_iter().map(|j| j.id).collect();
    assert_eq!(listed, created);
}
