use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use orchestrator_training_client_interface::MockTrainingClient;
use rstest::rstest;
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use crate::core::config::Config;
use crate::server::route::server_router;
use crate::tests::common::{create_job_in_db, get_job, review_payload};
use crate::tests::config::{ConfigType, TestConfigBuilder};
use crate::types::jobs::types::{JobStatus, JobType};
use crate::types::queue::QueueType;

async fn router() -> (Router, Arc<Config>) {
    let config = TestConfigBuilder::new().build().await.config;
    (server_router(config.clone()), config)
}

async fn send(router: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn health_reports_up() {
    let (router, _) = router().await;

    let (status, body) = send(router, get("/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "UP");
}

#[tokio::test]
async fn submitted_job_can_be_read_back() {
    let (router, config) = router().await;

    let (status, body) = send(router.clone(), post_json("/jobs", json!({"kind": "review", "payload": review_payload()}))).await;
    assert_eq!(status, StatusCode::CREATED);
    let id = body["data"]["id"].as_str().unwrap().to_string();
    assert_eq!(config.queue().queue_depth(QueueType::ReviewJobs).await.unwrap(), 1);

    let (status, body) = send(router, get(&format!("/jobs/{}", id))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["id"], id.as_str());
    assert_eq!(body["data"]["kind"], "review");
    assert_eq!(body["data"]["status"], "pending");
    assert_eq!(body["data"]["attempt"], 0);
}

#[tokio::test]
async fn unknown_kind_is_a_bad_request() {
    let (router, config) = router().await;

    let (status, body) = send(router, post_json("/jobs", json!({"kind": "translate", "payload": {}}))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert!(body["message"].as_str().unwrap().contains("translate"));
    assert_eq!(config.database().count_jobs_by_status(JobStatus::Pending).await.unwrap(), 0);
}

#[rstest]
#[case("/jobs/not-a-uuid", StatusCode::BAD_REQUEST)]
#[case("/jobs/00000000-0000-0000-0000-000000000000", StatusCode::NOT_FOUND)]
#[case("/jobs?kind=translate", StatusCode::BAD_REQUEST)]
#[case("/jobs?status=paused", StatusCode::BAD_REQUEST)]
#[case("/nowhere", StatusCode::NOT_FOUND)]
#[tokio::test]
async fn bad_reads_are_rejected(#[case] uri: &str, #[case] expected: StatusCode) {
    let (router, _) = router().await;

    let (status, _) = send(router, get(uri)).await;

    assert_eq!(status, expected);
}

#[tokio::test]
async fn jobs_are_listed_with_filters() {
    let (router, config) = router().await;
    create_job_in_db(&config, JobType::Review, JobStatus::Pending, 0).await;
    create_job_in_db(&config, JobType::Review, JobStatus::Succeeded, 1).await;
    create_job_in_db(&config, JobType::LocalTrain, JobStatus::Pending, 0).await;

    let (status, body) = send(router.clone(), get("/jobs?kind=review")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 2);

    let (_, body) = send(router.clone(), get("/jobs?kind=review&status=succeeded")).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"][0]["status"], "succeeded");

    let (_, body) = send(router, get("/jobs?limit=1")).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn pending_job_is_cancelled_and_finished_job_conflicts() {
    let (router, config) = router().await;
    let pending = create_job_in_db(&config, JobType::Review, JobStatus::Pending, 0).await;
    let finished = create_job_in_db(&config, JobType::Review, JobStatus::Succeeded, 1).await;

    let (status, body) = send(router.clone(), post_json(&format!("/jobs/{}/cancel", pending.id), json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "cancelled");
    assert_eq!(get_job(&config, pending.id).await.status, JobStatus::Cancelled);

    let (status, body) = send(router.clone(), post_json(&format!("/jobs/{}/cancel", finished.id), json!({}))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["success"], false);

    let (status, _) = send(router, post_json(&format!("/jobs/{}/cancel", Uuid::new_v4()), json!({}))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn api_server_serves_over_tcp_and_shuts_down() {
    let mut training_client = MockTrainingClient::new();
    training_client.expect_poll().times(0);
    let services = TestConfigBuilder::new()
        .configure_training_client(ConfigType::Mock(training_client))
        .configure_api_server()
        .build()
        .await;
    let address = services.api_server_address.unwrap();
    assert_ne!(address.port(), 0);

    let mut stream = tokio::net::TcpStream::connect(address).await.unwrap();
    tokio::io::AsyncWriteExt::write_all(&mut stream, b"GET /health HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
        .await
        .unwrap();
    let mut response = String::new();
    tokio::io::AsyncReadExt::read_to_string(&mut stream, &mut response).await.unwrap();
    assert!(response.starts_with("HTTP/1.1 200"));

    services.server_handle.unwrap().shutdown().await.unwrap();
}
