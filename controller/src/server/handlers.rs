//! HTTP request handlers

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use secrecy::ExposeSecret;
use serde::Serialize;
use tracing::{error, info, warn};

use crate::authn::bearer::{parse_bearer, verify_token};
use crate::authn::signature::{verify, SIGNATURE_256_HEADER, SIGNATURE_HEADER};
use crate::models::{
    CustomResourceEvent, EventItem, PipelineStageEvent, PushEvent, QueueBatch, QueueRecord,
};
use crate::server::state::ServerState;
use crate::utils::{generate_uuid, version_info};
use crate::workers::dispatcher::Job;

/// Delivery id header set by the source host
pub const DELIVERY_HEADER: &str = "x-github-delivery";

/// Event type header set by the source host
pub const EVENT_HEADER: &str = "x-github-event";

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
}

/// Health check handler
pub async fn health_handler() -> impl IntoResponse {
    let version = version_info();
    Json(HealthResponse {
        status: "healthy".to_string(),
        service: "pipewright".to_string(),
        version: version.version,
    })
}

/// Version response
#[derive(Debug, Serialize)]
pub struct VersionResponse {
    pub version: String,
    pub git_hash: String,
    pub build_time: String,
}

/// Version handler
pub async fn version_handler() -> impl IntoResponse {
    let version = version_info();
    Json(VersionResponse {
        version: version.version,
        git_hash: version.git_hash,
        build_time: version.build_time,
    })
}

/// Webhook acknowledgement
#[derive(Debug, Serialize)]
pub struct WebhookResponse {
    pub id: String,
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}

/// Compact a JSON body; anything else passes through unchanged
fn compact_payload(body: &[u8]) -> String {
    match serde_json::from_slice::<serde_json::Value>(body) {
        Ok(value) => value.to_string(),
        Err(_) => String::from_utf8_lossy(body).into_owned(),
    }
}

async fn enqueue(state: &ServerState, job: Job) -> Result<(), StatusCode> {
    let kind = job.kind();
    state.jobs.send(job).await.map_err(|_| {
        error!(job = kind, "Job queue closed, rejecting request");
        StatusCode::SERVICE_UNAVAILABLE
    })
}

/// Signed webhook delivery handler
pub async fn webhook_handler(
    State(state): State<Arc<ServerState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, StatusCode> {
    let Some(signature) =
        header(&headers, SIGNATURE_256_HEADER).or_else(|| header(&headers, SIGNATURE_HEADER))
    else {
        warn!("Webhook delivery without signature");
        return Err(StatusCode::UNAUTHORIZED);
    };

    let key = state.secrets.get(&state.hmac_key).await.map_err(|e| {
        error!(error = %e, "Unable to read webhook signing key");
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    if let Err(e) = verify(key.expose_secret().as_bytes(), &body, signature) {
        warn!(error = %e, "Rejecting webhook delivery");
        return Err(StatusCode::UNAUTHORIZED);
    }

    let item = EventItem {
        id: header(&headers, DELIVERY_HEADER)
            .map(str::to_string)
            .unwrap_or_else(generate_uuid),
        timestamp: chrono::Utc::now().to_rfc3339(),
        event_type: header(&headers, EVENT_HEADER).unwrap_or_default().to_string(),
        payload: compact_payload(&body),
    };
    info!(id = %item.id, event_type = %item.event_type, "Webhook delivery accepted");

    let id = item.id.clone();
    let batch = QueueBatch {
        records: vec![QueueRecord::insert(item)],
    };
    enqueue(&state, Job::Batch(batch)).await?;

    Ok(Json(WebhookResponse { id }))
}

/// Reject invocation requests without the shared bearer token
pub async fn require_invoke_token(
    State(state): State<Arc<ServerState>>,
    request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let Some(token) = header(request.headers(), AUTHORIZATION.as_str())
        .and_then(parse_bearer)
        .map(str::to_owned)
    else {
        warn!(path = %request.uri().path(), "Invocation without bearer token");
        return Err(StatusCode::UNAUTHORIZED);
    };

    let expected = state.secrets.get(&state.invoke_key).await.map_err(|e| {
        error!(error = %e, "Unable to read invocation token");
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    if let Err(e) = verify_token(expected.expose_secret().as_bytes(), token.as_bytes()) {
        warn!(path = %request.uri().path(), error = %e, "Rejecting invocation");
        return Err(StatusCode::UNAUTHORIZED);
    }

    Ok(next.run(request).await)
}

/// Queue batch handler
pub async fn batches_handler(
    State(state): State<Arc<ServerState>>,
    Json(batch): Json<QueueBatch>,
) -> Result<StatusCode, StatusCode> {
    enqueue(&state, Job::Batch(batch)).await?;
    Ok(StatusCode::ACCEPTED)
}

/// Push continuation handler
pub async fn invoke_push_handler(
    State(state): State<Arc<ServerState>>,
    Json(event): Json<PushEvent>,
) -> Result<StatusCode, StatusCode> {
    enqueue(&state, Job::Push(event)).await?;
    Ok(StatusCode::ACCEPTED)
}

/// Stack cleanup handler
pub async fn invoke_cleanup_handler(
    State(state): State<Arc<ServerState>>,
    Json(event): Json<CustomResourceEvent>,
) -> Result<StatusCode, StatusCode> {
    enqueue(&state, Job::Cleanup(event)).await?;
    Ok(StatusCode::ACCEPTED)
}

/// Pipeline stage change handler
pub async fn pipeline_event_handler(
    State(state): State<Arc<ServerState>>,
    Json(event): Json<PipelineStageEvent>,
) -> Result<StatusCode, StatusCode> {
    enqueue(&state, Job::Notify(event)).await?;
    Ok(StatusCode::ACCEPTED)
}
