mod common;

use std::collections::HashMap;
use std::time::Duration;

use tokio::time::Instant;

use common::{continuation, fast_watch, FakeRepo, FakeStacks, Harness, StackCall, NEVER};
use pipewright::cleaner::{CleanerOptions, StackCleaner, STACK_PROPERTY};
use pipewright::deploy::continuation::RunOutcome;
use pipewright::errors::ControllerError;
use pipewright::models::{CustomResourceEvent, RequestType, ResponseStatus};

const RESPONSE_URL: &str = "https://responses.example/signed";
const LOG_LOCATION: &str = "logs/pipewright-cleanup";

fn cleaner(harness: &Harness, deadline: Duration) -> StackCleaner {
    let options = CleanerOptions {
        continuation: continuation(deadline, "cleanup"),
        watch: fast_watch(),
        log_location: LOG_LOCATION.to_string(),
    };
    StackCleaner::new(harness.services(), options)
}

fn request(request_type: RequestType, stack: Option<&str>) -> CustomResourceEvent {
    let mut properties = HashMap::new();
    if let Some(stack) = stack {
        properties.insert(STACK_PROPERTY.to_string(), serde_json::json!(stack));
    }

    CustomResourceEvent {
        request_type,
        response_url: RESPONSE_URL.to_string(),
        stack_id: "stack/widgets-infra".to_string(),
        request_id: "req-1".to_string(),
        logical_resource_id: "PipelineCleanup".to_string(),
        physical_resource_id: None,
        resource_properties: properties,
    }
}

#[tokio::test]
async fn test_create_request_succeeds_without_changes() {
    let harness = Harness::new(FakeStacks::new(0), FakeRepo::standard());

    let outcome = cleaner(&harness, Duration::from_secs(5))
        .process(request(RequestType::Create, Some("widgets-dev-1")), Instant::now())
        .await
        .unwrap();

    assert_eq!(outcome, RunOutcome::Finished(()));
    assert!(harness.stacks.calls().is_empty());

    let responses = harness.responder.responses();
    assert_eq!(responses.len(), 1);
    let (url, response) = &responses[0];
    assert_eq!(url, RESPONSE_URL);
    assert_eq!(response.status, ResponseStatus::Success);
    assert_eq!(response.physical_resource_id.as_deref(), Some(LOG_LOCATION));
    assert_eq!(response.request_id, "req-1");
}

#[tokio::test]
async fn test_delete_removes_stack() {
    let stacks = FakeStacks::new(2);
    stacks.seed("widgets-dev-1", "UPDATE_COMPLETE", true);
    let harness = Harness::new(stacks, FakeRepo::standard());

    let outcome = cleaner(&harness, Duration::from_secs(5))
        .process(request(RequestType::Delete, Some("widgets-dev-1")), Instant::now())
        .await
        .unwrap();

    assert_eq!(outcome, RunOutcome::Finished(()));
    assert_eq!(
        harness.stacks.calls(),
        vec![StackCall::Delete("widgets-dev-1".to_string())]
    );
    assert_eq!(harness.stacks.current("widgets-dev-1"), None);

    let responses = harness.responder.responses();
    assert_eq!(responses.len(), 1);
    assert_eq!(responses[0].1.status, ResponseStatus::Success);
}

#[tokio::test]
async fn test_delete_missing_stack_succeeds() {
    let harness = Harness::new(FakeStacks::new(0), FakeRepo::standard());

    let outcome = cleaner(&harness, Duration::from_secs(5))
        .process(request(RequestType::Delete, Some("widgets-gone")), Instant::now())
        .await
        .unwrap();

    assert_eq!(outcome, RunOutcome::Finished(()));
    assert!(harness.stacks.calls().is_empty());
    assert_eq!(harness.responder.responses()[0].1.status, ResponseStatus::Success);
}

#[tokio::test]
async fn test_delete_waits_for_running_operation() {
    let stacks = FakeStacks::new(0);
    stacks.seed_running("widgets-dev-1", "DELETE_IN_PROGRESS", "DELETE_COMPLETE", 2);
    let harness = Harness::new(stacks, FakeRepo::standard());

    let outcome = cleaner(&harness, Duration::from_secs(5))
        .process(request(RequestType::Delete, Some("widgets-dev-1")), Instant::now())
        .await
        .unwrap();

    assert_eq!(outcome, RunOutcome::Finished(()));
    // Already being deleted, so no second request
    assert!(harness.stacks.calls().is_empty());
}

#[tokio::test]
async fn test_failed_deletion_reports_failure() {
    let stacks = FakeStacks::new(1);
    stacks.seed("widgets-dev-1", "UPDATE_COMPLETE", true);
    stacks.fail_next("DELETE_FAILED");
    let harness = Harness::new(stacks, FakeRepo::standard());

    let err = cleaner(&harness, Duration::from_secs(5))
        .process(request(RequestType::Delete, Some("widgets-dev-1")), Instant::now())
        .await
        .unwrap_err();

    assert!(matches!(err, ControllerError::StackFailed { .. }));
    let responses = harness.responder.responses();
    assert_eq!(responses.len(), 1);
    assert_eq!(responses[0].1.status, ResponseStatus::Failed);
    assert_eq!(responses[0].1.reason.as_deref(), Some(LOG_LOCATION));
}

#[tokio::test]
async fn test_missing_stack_property_fails() {
    let harness = Harness::new(FakeStacks::new(0), FakeRepo::standard());

    let err = cleaner(&harness, Duration::from_secs(5))
        .process(request(RequestType::Delete, None), Instant::now())
        .await
        .unwrap_err();

    assert!(matches!(err, ControllerError::ParameterError(_)));
    assert_eq!(harness.responder.responses()[0].1.status, ResponseStatus::Failed);
}

#[tokio::test]
async fn test_deadline_hands_off_cleanup() {
    let stacks = FakeStacks::new(NEVER);
    stacks.seed("widgets-dev-1", "UPDATE_COMPLETE", true);
    let harness = Harness::new(stacks, FakeRepo::standard());
    let event = request(RequestType::Delete, Some("widgets-dev-1"));

    let outcome = cleaner(&harness, Duration::from_millis(100))
        .process(event.clone(), Instant::now())
        .await
        .unwrap();

    assert_eq!(outcome, RunOutcome::Continued);
    let invocations = harness.invoker.calls();
    assert_eq!(invocations.len(), 1);
    assert_eq!(invocations[0].0, "cleanup");
    assert_eq!(invocations[0].1, serde_json::to_value(&event).unwrap());

    // The continuation answers the request
    assert!(harness.responder.responses().is_empty());
    assert_eq!(
        harness.stacks.current("widgets-dev-1").as_deref(),
        Some("DELETE_IN_PROGRESS")
    );
}
