mod common;

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use tokio::sync::mpsc;
use tower::ServiceExt;

use common::{push_event, FakeSecrets, HMAC_KEY, INVOKE_KEY, INVOKE_TOKEN};
use pipewright::authn::signature::{sign_sha256, SIGNATURE_256_HEADER};
use pipewright::models::{ChangeType, PipelineState, EVENT_TYPE_PUSH};
use pipewright::server::handlers::{DELIVERY_HEADER, EVENT_HEADER};
use pipewright::server::serve::router;
use pipewright::server::state::ServerState;
use pipewright::workers::dispatcher::Job;

const PUSH_BODY: &str = "{\n  \"ref\": \"refs/heads/dev-1\",\n  \"after\": \"9f2c4e1a7b\"\n}";

fn setup(secrets: Arc<FakeSecrets>) -> (axum::Router, mpsc::Receiver<Job>) {
    let (tx, rx) = mpsc::channel(8);
    let state = ServerState::new(tx, secrets, HMAC_KEY, INVOKE_KEY);
    (router(Arc::new(state)), rx)
}

fn webhook(body: &str, signature: Option<String>) -> Request<Body> {
    let mut request = Request::builder()
        .method("POST")
        .uri("/webhook")
        .header(DELIVERY_HEADER, "delivery-1")
        .header(EVENT_HEADER, EVENT_TYPE_PUSH);
    if let Some(signature) = signature {
        request = request.header(SIGNATURE_256_HEADER, signature);
    }
    request.body(Body::from(body.to_string())).unwrap()
}

fn json_post(uri: &str, body: serde_json::Value) -> Request<Body> {
    json_post_with(uri, body, Some(INVOKE_TOKEN))
}

fn json_post_with(uri: &str, body: serde_json::Value, token: Option<&str>) -> Request<Body> {
    let mut request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(token) = token {
        request = request.header("authorization", format!("Bearer {}", token));
    }
    request.body(Body::from(body.to_string())).unwrap()
}

fn batch_body() -> serde_json::Value {
    serde_json::json!({
        "records": [{
            "event_name": "INSERT",
            "item": {
                "id": "delivery-1",
                "timestamp": "2026-01-05T10:00:00Z",
                "type": "push",
                "payload": PUSH_BODY,
            }
        }]
    })
}

#[tokio::test]
async fn test_health() {
    let (app, _rx) = setup(FakeSecrets::standard());

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_signed_webhook_is_queued() {
    let (app, mut rx) = setup(FakeSecrets::standard());
    let signature = sign_sha256(b"hook-key", PUSH_BODY.as_bytes()).unwrap();

    let response = app.oneshot(webhook(PUSH_BODY, Some(signature))).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let ack: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(ack["id"], "delivery-1");

    let Some(Job::Batch(batch)) = rx.recv().await else {
        panic!("expected a queued batch");
    };
    assert_eq!(batch.records.len(), 1);
    let record = &batch.records[0];
    assert_eq!(record.event_name, ChangeType::Insert);
    assert_eq!(record.item.id, "delivery-1");
    assert_eq!(record.item.event_type, "push");
    assert_eq!(
        record.item.payload,
        r#"{"after":"9f2c4e1a7b","ref":"refs/heads/dev-1"}"#
    );
}

#[tokio::test]
async fn test_bad_signature_is_rejected() {
    let (app, mut rx) = setup(FakeSecrets::standard());
    let signature = sign_sha256(b"wrong-key", PUSH_BODY.as_bytes()).unwrap();

    let response = app.oneshot(webhook(PUSH_BODY, Some(signature))).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn test_unsigned_webhook_is_rejected() {
    let (app, mut rx) = setup(FakeSecrets::standard());

    let response = app.oneshot(webhook(PUSH_BODY, None)).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn test_missing_signing_key() {
    let (app, _rx) = setup(FakeSecrets::new(&[]));
    let signature = sign_sha256(b"hook-key", PUSH_BODY.as_bytes()).unwrap();

    let response = app.oneshot(webhook(PUSH_BODY, Some(signature))).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_push_continuation_is_accepted() {
    let (app, mut rx) = setup(FakeSecrets::standard());
    let event = push_event("refs/heads/dev-1");

    let response = app
        .oneshot(json_post("/invoke/push", serde_json::to_value(&event).unwrap()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::ACCEPTED);
    match rx.recv().await {
        Some(Job::Push(queued)) => assert_eq!(queued, event),
        other => panic!("unexpected job: {:?}", other),
    }
}

#[tokio::test]
async fn test_pipeline_event_is_accepted() {
    let (app, mut rx) = setup(FakeSecrets::standard());
    let body = serde_json::json!({
        "pipeline": "widgets-dev-1",
        "execution-id": "exec-1",
        "stage": "Build",
        "state": "SUCCEEDED",
    });

    let response = app.oneshot(json_post("/events/pipeline", body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::ACCEPTED);
    match rx.recv().await {
        Some(Job::Notify(event)) => {
            assert_eq!(event.stage, "Build");
            assert_eq!(event.state, PipelineState::Succeeded);
        }
        other => panic!("unexpected job: {:?}", other),
    }
}

#[tokio::test]
async fn test_closed_queue_is_unavailable() {
    let (app, rx) = setup(FakeSecrets::standard());
    drop(rx);

    let response = app
        .oneshot(json_post("/batches", serde_json::json!({ "records": [] })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_unauthenticated_invocations_are_rejected() {
    for uri in ["/batches", "/invoke/push", "/invoke/cleanup", "/events/pipeline"] {
        let (app, mut rx) = setup(FakeSecrets::standard());

        let response = app
            .oneshot(json_post_with(uri, batch_body(), None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{}", uri);
        assert!(rx.try_recv().is_err(), "{}", uri);
    }
}

#[tokio::test]
async fn test_wrong_invoke_token_is_rejected() {
    let (app, mut rx) = setup(FakeSecrets::standard());

    let response = app
        .oneshot(json_post_with("/batches", batch_body(), Some("not-the-token")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn test_authenticated_batch_is_queued() {
    let (app, mut rx) = setup(FakeSecrets::standard());

    let response = app.oneshot(json_post("/batches", batch_body())).await.unwrap();

    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let Some(Job::Batch(batch)) = rx.recv().await else {
        panic!("expected a queued batch");
    };
    assert_eq!(batch.records[0].item.id, "delivery-1");
}

#[tokio::test]
async fn test_missing_invoke_key() {
    let (app, mut rx) = setup(FakeSecrets::new(&[(HMAC_KEY, "hook-key")]));

    let response = app
        .oneshot(json_post("/invoke/cleanup", serde_json::json!({})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn test_health_needs_no_token() {
    let (app, _rx) = setup(FakeSecrets::new(&[]));

    let response = app
        .oneshot(Request::builder().uri("/version").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}
