//! Integration tests for waiting on asynchronous tasks.

mod common;

use std::time::Duration;

use serde_json::json;
use storage_api::rest::{ResourceDescriptor, ResourceError, TaskRef, WaitPolicy};
use storage_api::{Context, ContextError};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fast_policy(attempts: u32) -> WaitPolicy {
    WaitPolicy::default()
        .with_attempts(attempts)
        .with_interval(Duration::from_millis(10))
}

fn task_state(state: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "id": 7,
        "name": "resize volume db01",
        "state": state,
        "messages": []
    }))
}

#[tokio::test]
async fn test_running_then_completed_returns_record() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/volumes"))
        .respond_with(ResponseTemplate::new(202).set_body_json(json!({"task_id": 7})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/tasks/7"))
        .respond_with(task_state("running"))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/tasks/7"))
        .respond_with(task_state("completed"))
        .expect(1)
        .mount(&server)
        .await;

    let client = common::connect(&server).await;
    let ctx = Context::background();
    let accepted = client
        .resource(ResourceDescriptor::new("volumes", "volume"))
        .create(&ctx, json!({"name": "db01"}))
        .await
        .unwrap();

    let task = TaskRef::from_record(&client, &accepted).unwrap();
    assert_eq!(task.id(), 7);

    let finished = task.wait(&ctx, &fast_policy(5)).await.unwrap();
    assert_eq!(finished.get_str("state"), Some("completed"));
    assert_eq!(finished.resource_type(), Some("task"));
}

#[tokio::test]
async fn test_always_running_times_out_after_budget() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/tasks/7"))
        .respond_with(task_state("running"))
        .expect(3)
        .mount(&server)
        .await;

    let client = common::connect(&server).await;
    let error = client
        .task(7)
        .wait(&Context::background(), &fast_policy(3))
        .await
        .unwrap_err();

    assert!(matches!(
        error,
        ResourceError::TaskTimeout { id: 7, attempts: 3 }
    ));
}

#[tokio::test]
async fn test_failed_state_fails_immediately_with_last_message() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/tasks/7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 7,
            "name": "resize volume db01",
            "state": "failed",
            "messages": ["validating", {"message": "pool is full"}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = common::connect(&server).await;
    let error = client
        .task(7)
        .wait(&Context::background(), &fast_policy(30))
        .await
        .unwrap_err();

    match error {
        ResourceError::TaskFailed { id, name, message } => {
            assert_eq!(id, 7);
            assert_eq!(name, "resize volume db01");
            assert_eq!(message, "pool is full");
        }
        other => panic!("expected TaskFailed, got {other:?}"),
    }
}

#[tokio::test]
async fn test_failed_state_without_messages() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/tasks/7"))
        .respond_with(task_state("aborted"))
        .expect(1)
        .mount(&server)
        .await;

    let client = common::connect(&server).await;
    let error = client
        .task(7)
        .wait(&Context::background(), &fast_policy(30))
        .await
        .unwrap_err();

    assert!(matches!(error, ResourceError::TaskNoMessages { id: 7, .. }));
}

#[tokio::test]
async fn test_deadline_stops_polling_early() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/tasks/7"))
        .respond_with(task_state("running"))
        .mount(&server)
        .await;

    let client = common::connect(&server).await;
    let ctx = Context::background().with_timeout(Duration::from_millis(150));
    let policy = WaitPolicy::default()
        .with_attempts(1000)
        .with_interval(Duration::from_millis(50));

    let error = client.task(7).wait(&ctx, &policy).await.unwrap_err();
    assert!(matches!(
        error,
        ResourceError::Context(ContextError::DeadlineExceeded)
    ));
}

#[tokio::test]
async fn test_huge_multiplier_saturates_instead_of_overflowing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/tasks/7"))
        .respond_with(task_state("running"))
        .mount(&server)
        .await;

    let client = common::connect(&server).await;
    let ctx = Context::background().with_timeout(Duration::from_millis(200));
    let policy = WaitPolicy::default()
        .with_attempts(3)
        .with_interval(Duration::from_millis(1))
        .with_multiplier(1e300);

    let error = client.task(7).wait(&ctx, &policy).await.unwrap_err();
    assert!(matches!(
        error,
        ResourceError::Context(ContextError::DeadlineExceeded)
    ));
}

#[tokio::test]
async fn test_task_deadline_bounds_wait() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/tasks/7"))
        .respond_with(task_state("running"))
        .mount(&server)
        .await;

    let client = common::connect(&server).await;
    let deadline = tokio::time::Instant::now() + Duration::from_millis(100);
    let policy = WaitPolicy::default()
        .with_attempts(1000)
        .with_interval(Duration::from_millis(20));

    let error = client
        .task(7)
        .with_deadline(deadline)
        .wait(&Context::background(), &policy)
        .await
        .unwrap_err();
    assert!(matches!(error, ResourceError::Context(_)));
}

#[tokio::test]
async fn test_transient_fetch_error_is_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/tasks/7"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/tasks/7"))
        .respond_with(task_state("completed"))
        .mount(&server)
        .await;

    let client = common::connect(&server).await;
    let record = client
        .task(7)
        .wait(&Context::background(), &fast_policy(3))
        .await
        .unwrap();
    assert_eq!(record.get_str("state"), Some("completed"));
}

#[tokio::test]
async fn test_persistent_fetch_error_is_returned() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/tasks/7"))
        .respond_with(ResponseTemplate::new(404))
        .expect(2)
        .mount(&server)
        .await;

    let client = common::connect(&server).await;
    let error = client
        .task(7)
        .wait(&Context::background(), &fast_policy(2))
        .await
        .unwrap_err();
    assert_eq!(error.status(), Some(404));
}
