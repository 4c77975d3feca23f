//! HTTP server setup

use std::future::Future;
use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::app::options::ServerOptions;
use crate::errors::ControllerError;
use crate::server::handlers::{
    batches_handler, health_handler, invoke_cleanup_handler, invoke_push_handler,
    pipeline_event_handler, require_invoke_token, version_handler, webhook_handler,
};
use crate::server::state::ServerState;

/// Build the service router
pub fn router(state: Arc<ServerState>) -> Router {
    // Internal callers authenticate with the shared invocation token
    let invocations = Router::new()
        .route("/batches", post(batches_handler))
        .route("/invoke/push", post(invoke_push_handler))
        .route("/invoke/cleanup", post(invoke_cleanup_handler))
        .route("/events/pipeline", post(pipeline_event_handler))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_invoke_token,
        ));

    Router::new()
        // Health and version
        .route("/health", get(health_handler))
        .route("/version", get(version_handler))
        // Signed webhook deliveries
        .route("/webhook", post(webhook_handler))
        .merge(invocations)
        // State and middleware
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// Start the HTTP server
pub async fn serve(
    options: &ServerOptions,
    state: Arc<ServerState>,
    shutdown_signal: impl Future<Output = ()> + Send + 'static,
) -> Result<JoinHandle<Result<(), ControllerError>>, ControllerError> {
    let app = router(state);

    let addr = format!("{}:{}", options.host, options.port);
    info!("Starting HTTP server on {}", addr);

    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| ControllerError::ServerError(e.to_string()))?;

    let handle = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal)
            .await
            .map_err(|e| ControllerError::ServerError(e.to_string()))
    });

    Ok(handle)
}
